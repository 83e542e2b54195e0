//! Check command implementation
//!
//! Prints the reference problem and the effective run configuration.

use integrator_core::problem::{Integrand, ProblemDefinition};
use std::fmt::Write as _;
use tracing::info;

use crate::config::RunConfig;
use crate::Result;

/// Run the check command
pub fn run(config: &RunConfig) -> Result<()> {
    let problem = ProblemDefinition::correlated_gaussian_5d()?;
    let driver = config.driver_config()?;
    info!("Configuration valid");
    println!("{}", describe_problem(&problem));
    println!(
        "run: {} iterations, check every {}, hard reset at {}, band [{}, {}], drift policy {}",
        driver.total_iterations(),
        driver.check_interval(),
        driver
            .hard_reset_at()
            .map_or_else(|| "never".to_string(), |i| i.to_string()),
        driver.band().lower(),
        driver.band().upper(),
        config.on_drift
    );
    println!(
        "checkpoints: {}/{}_<level>.astate",
        driver.checkpoint_dir().display(),
        driver.checkpoint_prefix()
    );
    Ok(())
}

/// Render a problem definition
pub fn describe_problem(problem: &ProblemDefinition) -> String {
    let mut out = format!("problem: {}-dimensional correlated Gaussian\n", problem.dimension());
    for (i, row) in problem.axes().iter().enumerate() {
        let _ = writeln!(
            out,
            "  axis {i}: {:?}  mean {:.8}  sigma {}",
            row,
            problem.mean()[i],
            problem.sigma()[i]
        );
    }
    let _ = writeln!(out, "  jacobian            {:.6}", problem.jacobian());
    let _ = writeln!(out, "  gnorm               {:.6e}", problem.gnorm());
    let _ = write!(
        out,
        "  expected efficiency {:.6e}",
        problem.expected_efficiency()
    );
    out
}
