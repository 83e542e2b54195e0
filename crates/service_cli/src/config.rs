//! Run configuration management
//!
//! Handles loading configuration from TOML files, `INTEGRATOR_*` environment
//! variables and CLI arguments.

use integrator_engine::driver::DriverConfig;
use integrator_engine::recovery::RecoveryAction;
use integrator_engine::sampler::GridSamplerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "INTEGRATOR_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid drift policy: {0}. Must be one of: prompt, accept, expand, reset, revert")]
    InvalidDriftPolicy(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable {name} has invalid value '{value}'")]
    EnvError { name: String, value: String },

    #[error(transparent)]
    Engine(#[from] integrator_engine::ConfigError),
}

/// Log levels supported by the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// How drifted boundaries are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftPolicy {
    /// Ask on the terminal
    #[default]
    Prompt,
    /// Apply the same action every time
    Fixed(RecoveryAction),
}

impl FromStr for DriftPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("prompt") {
            return Ok(DriftPolicy::Prompt);
        }
        s.parse::<RecoveryAction>()
            .map(DriftPolicy::Fixed)
            .map_err(|_| ConfigError::InvalidDriftPolicy(s.to_string()))
    }
}

impl std::fmt::Display for DriftPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftPolicy::Prompt => write!(f, "prompt"),
            DriftPolicy::Fixed(action) => write!(f, "{action}"),
        }
    }
}

/// Run configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total number of iterations
    pub iterations: u64,
    /// Iterations between efficiency checks
    pub check_interval: u64,
    /// Iteration of the unconditional statistics reset (0 disables it)
    pub hard_reset_at: u64,
    /// Grid bins per axis
    pub bins: usize,
    /// Rebinning damping exponent
    pub alpha: f64,
    /// Training samples per bin required before adapting
    pub sensitivity: u64,
    /// Random seed (entropy when absent)
    pub seed: Option<u64>,
    /// Checkpoint directory
    pub checkpoint_dir: PathBuf,
    /// Checkpoint file prefix
    pub prefix: String,
    /// Snapshot restored before the run
    pub resume: Option<PathBuf>,
    /// Drift resolution
    #[serde(deserialize_with = "deserialize_drift_policy")]
    pub on_drift: DriftPolicy,
    /// Efficiency above which adaptation is relaxed
    pub quality_bar: f64,
    /// Sensitivity applied above the quality bar
    pub relaxed_sensitivity: u64,
    /// Lower efficiency band factor
    pub band_lower: f64,
    /// Upper efficiency band factor
    pub band_upper: f64,
    /// Sampler verbosity
    pub verbosity: u8,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_drift_policy<'de, D>(deserializer: D) -> Result<DriftPolicy, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DriftPolicy::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for RunConfig {
    fn default() -> Self {
        let driver = DriverConfig::default();
        let grid = GridSamplerConfig::default();
        Self {
            iterations: driver.total_iterations(),
            check_interval: driver.check_interval(),
            hard_reset_at: driver.hard_reset_at().unwrap_or(0),
            bins: grid.n_bins,
            alpha: grid.alpha,
            sensitivity: grid.sensitivity,
            seed: None,
            checkpoint_dir: PathBuf::from("."),
            prefix: "ex".to_string(),
            resume: None,
            on_drift: DriftPolicy::Prompt,
            quality_bar: driver.quality_bar(),
            relaxed_sensitivity: driver.relaxed_sensitivity(),
            band_lower: driver.band().lower(),
            band_upper: driver.band().upper(),
            verbosity: driver.verbosity(),
            log_level: LogLevel::Info,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: RunConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Override fields from `INTEGRATOR_*` variables found by `lookup`.
    ///
    /// `lookup` receives the variable name without the prefix.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::EnvError {
                name: format!("{ENV_PREFIX}{name}"),
                value,
            })
        }

        if let Some(v) = lookup("ITERATIONS") {
            self.iterations = parse("ITERATIONS", v)?;
        }
        if let Some(v) = lookup("CHECK_INTERVAL") {
            self.check_interval = parse("CHECK_INTERVAL", v)?;
        }
        if let Some(v) = lookup("HARD_RESET_AT") {
            self.hard_reset_at = parse("HARD_RESET_AT", v)?;
        }
        if let Some(v) = lookup("BINS") {
            self.bins = parse("BINS", v)?;
        }
        if let Some(v) = lookup("ALPHA") {
            self.alpha = parse("ALPHA", v)?;
        }
        if let Some(v) = lookup("SENSITIVITY") {
            self.sensitivity = parse("SENSITIVITY", v)?;
        }
        if let Some(v) = lookup("SEED") {
            self.seed = Some(parse("SEED", v)?);
        }
        if let Some(v) = lookup("CHECKPOINT_DIR") {
            self.checkpoint_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PREFIX") {
            self.prefix = v;
        }
        if let Some(v) = lookup("RESUME") {
            self.resume = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ON_DRIFT") {
            self.on_drift = DriftPolicy::from_str(&v)?;
        }
        if let Some(v) = lookup("QUALITY_BAR") {
            self.quality_bar = parse("QUALITY_BAR", v)?;
        }
        if let Some(v) = lookup("RELAXED_SENSITIVITY") {
            self.relaxed_sensitivity = parse("RELAXED_SENSITIVITY", v)?;
        }
        if let Some(v) = lookup("BAND_LOWER") {
            self.band_lower = parse("BAND_LOWER", v)?;
        }
        if let Some(v) = lookup("BAND_UPPER") {
            self.band_upper = parse("BAND_UPPER", v)?;
        }
        if let Some(v) = lookup("VERBOSITY") {
            self.verbosity = parse("VERBOSITY", v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&v)?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(n) = cli.iterations {
            self.iterations = n;
        }
        if let Some(n) = cli.check_interval {
            self.check_interval = n;
        }
        if let Some(n) = cli.hard_reset_at {
            self.hard_reset_at = n;
        }
        if let Some(n) = cli.bins {
            self.bins = n;
        }
        if let Some(a) = cli.alpha {
            self.alpha = a;
        }
        if let Some(n) = cli.sensitivity {
            self.sensitivity = n;
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(dir) = &cli.checkpoint_dir {
            self.checkpoint_dir = dir.clone();
        }
        if let Some(prefix) = &cli.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(resume) = &cli.resume {
            self.resume = Some(resume.clone());
        }
        if let Some(policy) = &cli.on_drift {
            self.on_drift = DriftPolicy::from_str(policy)?;
        }
        if let Some(bar) = cli.quality_bar {
            self.quality_bar = bar;
        }
        if let Some(n) = cli.relaxed_sensitivity {
            self.relaxed_sensitivity = n;
        }
        if let Some(lower) = cli.band_lower {
            self.band_lower = lower;
        }
        if let Some(upper) = cli.band_upper {
            self.band_upper = upper;
        }
        if let Some(v) = cli.verbosity {
            self.verbosity = v;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if cli.verbose {
            self.log_level = LogLevel::Debug;
        }
        Ok(())
    }

    /// Validate the configuration by building the engine configurations
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.driver_config()?;
        self.grid_config().validate()?;
        Ok(())
    }

    /// Driver configuration for this run
    pub fn driver_config(&self) -> Result<DriverConfig, ConfigError> {
        let hard_reset_at = (self.hard_reset_at > 0).then_some(self.hard_reset_at);
        let config = DriverConfig::builder()
            .total_iterations(self.iterations)
            .check_interval(self.check_interval)
            .hard_reset_at(hard_reset_at)
            .quality_bar(self.quality_bar)
            .relaxed_sensitivity(self.relaxed_sensitivity)
            .band(self.band_lower, self.band_upper)
            .checkpoint_dir(&self.checkpoint_dir)
            .checkpoint_prefix(&self.prefix)
            .verbosity(self.verbosity)
            .build()?;
        Ok(config)
    }

    /// Grid sampler configuration for this run
    pub fn grid_config(&self) -> GridSamplerConfig {
        GridSamplerConfig {
            n_bins: self.bins,
            alpha: self.alpha,
            sensitivity: self.sensitivity,
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    pub iterations: Option<u64>,
    pub check_interval: Option<u64>,
    pub hard_reset_at: Option<u64>,
    pub bins: Option<usize>,
    pub alpha: Option<f64>,
    pub sensitivity: Option<u64>,
    pub seed: Option<u64>,
    pub checkpoint_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub resume: Option<PathBuf>,
    pub on_drift: Option<String>,
    pub quality_bar: Option<f64>,
    pub relaxed_sensitivity: Option<u64>,
    pub band_lower: Option<f64>,
    pub band_upper: Option<f64>,
    pub verbosity: Option<u8>,
    pub log_level: Option<String>,
    pub verbose: bool,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<RunConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    config.apply_env(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())?;
    config.merge_with_cli(cli)?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.iterations, 10_000_000_000);
        assert_eq!(config.check_interval, 100_000_000);
        assert_eq!(config.hard_reset_at, 500_000_000);
        assert_eq!(config.bins, 50);
        assert_eq!(config.prefix, "ex");
        assert_eq!(config.on_drift, DriftPolicy::Prompt);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Warn").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_drift_policy_parsing() {
        assert_eq!(DriftPolicy::from_str("prompt").unwrap(), DriftPolicy::Prompt);
        assert_eq!(
            DriftPolicy::from_str("Accept").unwrap(),
            DriftPolicy::Fixed(RecoveryAction::Accept)
        );
        assert_eq!(
            DriftPolicy::from_str("revert").unwrap(),
            DriftPolicy::Fixed(RecoveryAction::Revert)
        );
        assert!(DriftPolicy::from_str("panic").is_err());
        assert_eq!(DriftPolicy::Fixed(RecoveryAction::Reset).to_string(), "reset");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            iterations = 2000000
            check_interval = 100000
            hard_reset_at = 0
            bins = 20
            seed = 7
            prefix = "gauss"
            on_drift = "expand"
            log_level = "warn"
        "#;

        let config: RunConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.iterations, 2_000_000);
        assert_eq!(config.bins, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.prefix, "gauss");
        assert_eq!(config.on_drift, DriftPolicy::Fixed(RecoveryAction::Expand));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.driver_config().unwrap().hard_reset_at(), None);
        // Unspecified fields keep their defaults
        assert_eq!(config.alpha, 1.5);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("integrator.toml");
        std::fs::write(&path, "check_interval = 0\n").unwrap();
        assert!(matches!(
            RunConfig::from_file(&path),
            Err(ConfigError::Engine(_))
        ));

        std::fs::write(&path, "bins = 8\n").unwrap();
        assert_eq!(RunConfig::from_file(&path).unwrap().bins, 8);

        assert!(matches!(
            RunConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ITERATIONS", "5000"),
            ("SEED", "12"),
            ("ON_DRIFT", "reset"),
            ("CHECKPOINT_DIR", "/var/tmp/run"),
        ]
        .into_iter()
        .collect();

        let mut config = RunConfig::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.iterations, 5000);
        assert_eq!(config.seed, Some(12));
        assert_eq!(config.on_drift, DriftPolicy::Fixed(RecoveryAction::Reset));
        assert_eq!(config.checkpoint_dir, PathBuf::from("/var/tmp/run"));
    }

    #[test]
    fn test_env_overrides_adaptation_keys() {
        let vars: HashMap<&str, &str> = [
            ("SENSITIVITY", "250"),
            ("QUALITY_BAR", "0.25"),
            ("RELAXED_SENSITIVITY", "4000"),
            ("BAND_LOWER", "0.5"),
            ("BAND_UPPER", "2.0"),
            ("VERBOSITY", "0"),
            ("RESUME", "/var/tmp/run/ex.astate"),
        ]
        .into_iter()
        .collect();

        let mut config = RunConfig::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.sensitivity, 250);
        assert_eq!(config.quality_bar, 0.25);
        assert_eq!(config.relaxed_sensitivity, 4000);
        assert_eq!(config.band_lower, 0.5);
        assert_eq!(config.band_upper, 2.0);
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.resume, Some(PathBuf::from("/var/tmp/run/ex.astate")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_env_for_adaptation_keys() {
        let mut config = RunConfig::default();
        config
            .apply_env(|name| match name {
                "SENSITIVITY" => Some("250".to_string()),
                "BAND_UPPER" => Some("2.0".to_string()),
                _ => None,
            })
            .unwrap();

        let cli = CliArgs {
            sensitivity: Some(40),
            quality_bar: Some(0.3),
            relaxed_sensitivity: Some(900),
            band_lower: Some(0.6),
            band_upper: Some(1.6),
            verbosity: Some(1),
            ..Default::default()
        };
        config.merge_with_cli(&cli).unwrap();

        assert_eq!(config.sensitivity, 40);
        assert_eq!(config.quality_bar, 0.3);
        assert_eq!(config.relaxed_sensitivity, 900);
        assert_eq!(config.band_lower, 0.6);
        assert_eq!(config.band_upper, 1.6);
        assert_eq!(config.verbosity, 1);
    }

    #[test]
    fn test_env_invalid_value() {
        let mut config = RunConfig::default();
        let err = config
            .apply_env(|name| (name == "BINS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("INTEGRATOR_BINS"));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = RunConfig::default();
        let cli = CliArgs {
            iterations: Some(1000),
            check_interval: Some(100),
            on_drift: Some("accept".to_string()),
            verbose: true,
            ..Default::default()
        };

        config.merge_with_cli(&cli).unwrap();

        assert_eq!(config.iterations, 1000);
        assert_eq!(config.check_interval, 100);
        assert_eq!(config.on_drift, DriftPolicy::Fixed(RecoveryAction::Accept));
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_grid_config_validation() {
        let config = RunConfig {
            bins: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
