//! Integration driver configuration.
//!
//! Use [`DriverConfig::builder`] to construct validated instances.

use crate::error::ConfigError;
use integrator_core::stats::EfficiencyBand;
use std::path::{Path, PathBuf};

/// Default total number of iterations.
pub const DEFAULT_TOTAL_ITERATIONS: u64 = 10_000_000_000;

/// Default number of iterations between check boundaries.
pub const DEFAULT_CHECK_INTERVAL: u64 = 100_000_000;

/// Default global iteration of the unconditional accumulator reset.
pub const DEFAULT_HARD_RESET_AT: u64 = 500_000_000;

/// Efficiency above which the relaxed adaptation sensitivity applies.
pub const DEFAULT_QUALITY_BAR: f64 = 0.1;

/// Adaptation sensitivity applied once the quality bar is exceeded.
pub const DEFAULT_RELAXED_SENSITIVITY: u64 = 1000;

/// Default checkpoint file prefix.
pub const DEFAULT_CHECKPOINT_PREFIX: &str = "integrator";

/// Default sampler verbosity.
pub const DEFAULT_VERBOSITY: u8 = 2;

/// Integration driver configuration.
///
/// # Examples
///
/// ```rust
/// use integrator_engine::driver::DriverConfig;
///
/// let config = DriverConfig::builder()
///     .total_iterations(1_000_000)
///     .check_interval(100_000)
///     .hard_reset_at(None)
///     .checkpoint_prefix("ex")
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.boundary_count(), 9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    total_iterations: u64,
    check_interval: u64,
    hard_reset_at: Option<u64>,
    quality_bar: f64,
    relaxed_sensitivity: u64,
    band: EfficiencyBand,
    checkpoint_dir: PathBuf,
    checkpoint_prefix: String,
    verbosity: u8,
}

impl DriverConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Total number of iterations.
    #[inline]
    pub fn total_iterations(&self) -> u64 {
        self.total_iterations
    }

    /// Iterations between check boundaries.
    #[inline]
    pub fn check_interval(&self) -> u64 {
        self.check_interval
    }

    /// Global iteration of the unconditional accumulator reset, if any.
    #[inline]
    pub fn hard_reset_at(&self) -> Option<u64> {
        self.hard_reset_at
    }

    /// Efficiency above which the relaxed sensitivity is applied.
    #[inline]
    pub fn quality_bar(&self) -> f64 {
        self.quality_bar
    }

    /// Relaxed adaptation sensitivity.
    #[inline]
    pub fn relaxed_sensitivity(&self) -> u64 {
        self.relaxed_sensitivity
    }

    /// Efficiency tolerance band.
    #[inline]
    pub fn band(&self) -> EfficiencyBand {
        self.band
    }

    /// Directory receiving checkpoint files.
    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// Checkpoint file prefix.
    pub fn checkpoint_prefix(&self) -> &str {
        &self.checkpoint_prefix
    }

    /// Sampler verbosity.
    #[inline]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Number of check boundaries in a full run (`i > 0`, `i % interval == 0`,
    /// `i < total`).
    pub fn boundary_count(&self) -> u64 {
        self.total_iterations.saturating_sub(1) / self.check_interval
    }

    /// Whether iteration `i` is a check boundary.
    #[inline]
    pub fn is_boundary(&self, iteration: u64) -> bool {
        iteration > 0 && iteration % self.check_interval == 0
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `total_iterations` or `check_interval` is 0
    /// - `quality_bar` is not finite
    /// - `checkpoint_prefix` is empty or contains a path separator
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_iterations == 0 {
            return Err(ConfigError::InvalidIterationCount(self.total_iterations));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::InvalidCheckInterval(self.check_interval));
        }
        if !self.quality_bar.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "quality_bar",
                value: format!("{} (must be finite)", self.quality_bar),
            });
        }
        if self.checkpoint_prefix.is_empty()
            || self.checkpoint_prefix.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidParameter {
                name: "checkpoint_prefix",
                value: format!("'{}' (must be a non-empty file name)", self.checkpoint_prefix),
            });
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            total_iterations: DEFAULT_TOTAL_ITERATIONS,
            check_interval: DEFAULT_CHECK_INTERVAL,
            hard_reset_at: Some(DEFAULT_HARD_RESET_AT),
            quality_bar: DEFAULT_QUALITY_BAR,
            relaxed_sensitivity: DEFAULT_RELAXED_SENSITIVITY,
            band: EfficiencyBand::default(),
            checkpoint_dir: PathBuf::from("."),
            checkpoint_prefix: DEFAULT_CHECKPOINT_PREFIX.to_string(),
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

/// Builder for [`DriverConfig`]. Unset fields take the defaults.
#[derive(Clone, Debug, Default)]
pub struct DriverConfigBuilder {
    total_iterations: Option<u64>,
    check_interval: Option<u64>,
    hard_reset_at: Option<Option<u64>>,
    quality_bar: Option<f64>,
    relaxed_sensitivity: Option<u64>,
    band: Option<(f64, f64)>,
    checkpoint_dir: Option<PathBuf>,
    checkpoint_prefix: Option<String>,
    verbosity: Option<u8>,
}

impl DriverConfigBuilder {
    /// Sets the total number of iterations.
    #[inline]
    pub fn total_iterations(mut self, n: u64) -> Self {
        self.total_iterations = Some(n);
        self
    }

    /// Sets the number of iterations between check boundaries.
    #[inline]
    pub fn check_interval(mut self, n: u64) -> Self {
        self.check_interval = Some(n);
        self
    }

    /// Sets (or disables, with `None`) the hard-reset iteration.
    #[inline]
    pub fn hard_reset_at(mut self, iteration: Option<u64>) -> Self {
        self.hard_reset_at = Some(iteration);
        self
    }

    /// Sets the quality bar.
    #[inline]
    pub fn quality_bar(mut self, bar: f64) -> Self {
        self.quality_bar = Some(bar);
        self
    }

    /// Sets the relaxed adaptation sensitivity.
    #[inline]
    pub fn relaxed_sensitivity(mut self, threshold: u64) -> Self {
        self.relaxed_sensitivity = Some(threshold);
        self
    }

    /// Sets the lower and upper band factors.
    #[inline]
    pub fn band(mut self, lower: f64, upper: f64) -> Self {
        self.band = Some((lower, upper));
        self
    }

    /// Sets the checkpoint directory.
    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Sets the checkpoint file prefix.
    pub fn checkpoint_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.checkpoint_prefix = Some(prefix.into());
        self
    }

    /// Sets the sampler verbosity.
    #[inline]
    pub fn verbosity(mut self, level: u8) -> Self {
        self.verbosity = Some(level);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the band factors are out of order or
    /// [`DriverConfig::validate`] fails.
    pub fn build(self) -> Result<DriverConfig, ConfigError> {
        let defaults = DriverConfig::default();
        let band = match self.band {
            Some((lower, upper)) => EfficiencyBand::new(lower, upper)?,
            None => defaults.band,
        };

        let config = DriverConfig {
            total_iterations: self.total_iterations.unwrap_or(defaults.total_iterations),
            check_interval: self.check_interval.unwrap_or(defaults.check_interval),
            hard_reset_at: self.hard_reset_at.unwrap_or(defaults.hard_reset_at),
            quality_bar: self.quality_bar.unwrap_or(defaults.quality_bar),
            relaxed_sensitivity: self
                .relaxed_sensitivity
                .unwrap_or(defaults.relaxed_sensitivity),
            band,
            checkpoint_dir: self.checkpoint_dir.unwrap_or(defaults.checkpoint_dir),
            checkpoint_prefix: self.checkpoint_prefix.unwrap_or(defaults.checkpoint_prefix),
            verbosity: self.verbosity.unwrap_or(defaults.verbosity),
        };

        config.validate()?;
        Ok(config)
    }
}
