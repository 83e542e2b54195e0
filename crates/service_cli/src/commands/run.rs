//! Run command implementation
//!
//! Integrates the reference 5-D Gaussian with the adaptive grid sampler
//! under the drift recovery protocol.

use integrator_core::problem::{Integrand, ProblemDefinition};
use integrator_engine::driver::{IntegrationDriver, RunReport};
use integrator_engine::recovery::{DecisionProvider, FixedDecision, PromptDecisions};
use integrator_engine::rng::SamplerRng;
use integrator_engine::sampler::GridSampler;
use std::fmt::Write as _;
use tracing::info;

use crate::config::{DriftPolicy, RunConfig};
use crate::{CliError, Result};

/// Run the integration
pub fn run(config: &RunConfig) -> Result<()> {
    let report = integrate(config)?;
    println!("{}", render_report(&report));
    Ok(())
}

/// Build the driver from `config` and run it to completion
pub fn integrate(config: &RunConfig) -> Result<RunReport> {
    let problem = ProblemDefinition::correlated_gaussian_5d()?;
    let rng = match config.seed {
        Some(seed) => SamplerRng::from_seed(seed),
        None => SamplerRng::from_entropy(),
    };
    info!(seed = rng.seed(), bins = config.bins, "Starting integration");

    let sampler = GridSampler::new(problem.dimension(), config.grid_config(), rng)?;
    let decisions: Box<dyn DecisionProvider> = match config.on_drift {
        DriftPolicy::Prompt => Box::new(PromptDecisions::stdio()),
        DriftPolicy::Fixed(action) => Box::new(FixedDecision::new(action)),
    };

    let mut driver = IntegrationDriver::new(config.driver_config()?, sampler, problem, decisions)?;
    if let Some(path) = &config.resume {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        driver.resume_from(path)?;
    }

    let report = driver.run()?;
    info!(level = report.level, "Integration complete");
    Ok(report)
}

/// Render the final report
pub fn render_report(report: &RunReport) -> String {
    let mut out = format!("{}\n", report.summary);
    let _ = writeln!(
        out,
        "iterations {}  level {}  baseline efficiency {:.6e}  boundaries {}",
        report.iterations,
        report.level,
        report.baseline,
        report.boundaries.len()
    );
    match &report.sampler_result {
        Some(r) => {
            let _ = writeln!(out, "sampler result: {:.10} +/- {:.3e}", r.mean, r.std_error);
        }
        None => out.push_str("sampler result: no samples\n"),
    }
    match &report.driver_result {
        Some(r) => {
            let _ = write!(
                out,
                "IS result: {:.10} +/- {:.3e}, efficiency {:.6e}",
                r.mean, r.std_error, r.efficiency
            );
        }
        None => out.push_str("IS result: no samples"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrator_engine::recovery::RecoveryAction;

    fn small_config(dir: &std::path::Path) -> RunConfig {
        RunConfig {
            iterations: 30_000,
            check_interval: 10_000,
            hard_reset_at: 0,
            seed: Some(17),
            checkpoint_dir: dir.to_path_buf(),
            prefix: "cli".to_string(),
            on_drift: DriftPolicy::Fixed(RecoveryAction::Expand),
            verbosity: 0,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_integrate_writes_checkpoints_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = integrate(&small_config(dir.path())).unwrap();

        assert_eq!(report.iterations, 30_000);
        assert_eq!(report.boundaries.len(), 2);
        assert!(dir.path().join("cli_0.astate").is_file());
        assert!(dir.path().join("cli.astate").is_file());

        let text = render_report(&report);
        assert!(text.contains("iterations 30000"));
        assert!(text.contains("IS result"));
    }

    #[test]
    fn test_resume_from_canonical() {
        let dir = tempfile::tempdir().unwrap();
        integrate(&small_config(dir.path())).unwrap();

        let config = RunConfig {
            resume: Some(dir.path().join("cli.astate")),
            ..small_config(dir.path())
        };
        assert!(integrate(&config).is_ok());
    }

    #[test]
    fn test_resume_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            resume: Some(dir.path().join("absent.astate")),
            ..small_config(dir.path())
        };
        assert!(matches!(integrate(&config), Err(CliError::FileNotFound(_))));
    }
}
