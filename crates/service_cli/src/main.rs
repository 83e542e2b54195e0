//! Integrator CLI - adaptive importance sampling with checkpoint recovery
//!
//! # Commands
//!
//! - `integrator run` - Integrate the reference 5-D Gaussian
//! - `integrator check` - Validate the configuration and print the problem
//! - `integrator inspect <FILE>` - Summarise a checkpoint file
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires integrator_core and
//! integrator_engine to configuration, logging and the terminal.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use config::{build_config, CliArgs};

/// Adaptive importance-sampling integrator
#[derive(Parser)]
#[command(name = "integrator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "INTEGRATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the integration
    Run(RunArgs),

    /// Validate the configuration and print the problem definition
    Check,

    /// Summarise a checkpoint file
    Inspect {
        /// Checkpoint file
        file: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Total number of iterations
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Iterations between efficiency checks
    #[arg(long)]
    check_interval: Option<u64>,

    /// Iteration of the unconditional statistics reset (0 disables)
    #[arg(long)]
    hard_reset_at: Option<u64>,

    /// Grid bins per axis
    #[arg(long)]
    bins: Option<usize>,

    /// Rebinning damping exponent
    #[arg(long)]
    alpha: Option<f64>,

    /// Training samples required before the grid may adapt
    #[arg(long)]
    sensitivity: Option<u64>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Checkpoint file prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Restore the sampler from this snapshot before running
    #[arg(short, long)]
    resume: Option<PathBuf>,

    /// Drift resolution: prompt, accept, expand, reset or revert
    #[arg(long)]
    on_drift: Option<String>,

    /// Efficiency above which adaptation is relaxed
    #[arg(long)]
    quality_bar: Option<f64>,

    /// Sensitivity applied once the quality bar is passed
    #[arg(long)]
    relaxed_sensitivity: Option<u64>,

    /// Lower bound of the measured/expected efficiency ratio
    #[arg(long)]
    band_lower: Option<f64>,

    /// Upper bound of the measured/expected efficiency ratio
    #[arg(long)]
    band_upper: Option<f64>,

    /// Sampler diagnostic verbosity
    #[arg(long)]
    verbosity: Option<u8>,
}

impl Cli {
    fn args(&self) -> CliArgs {
        let empty = RunArgs::default();
        let run = match &self.command {
            Commands::Run(args) => args,
            _ => &empty,
        };
        CliArgs {
            config_file: self.config.clone(),
            iterations: run.iterations,
            check_interval: run.check_interval,
            hard_reset_at: run.hard_reset_at,
            bins: run.bins,
            alpha: run.alpha,
            sensitivity: run.sensitivity,
            seed: run.seed,
            checkpoint_dir: run.checkpoint_dir.clone(),
            prefix: run.prefix.clone(),
            resume: run.resume.clone(),
            on_drift: run.on_drift.clone(),
            quality_bar: run.quality_bar,
            relaxed_sensitivity: run.relaxed_sensitivity,
            band_lower: run.band_lower,
            band_upper: run.band_upper,
            verbosity: run.verbosity,
            log_level: self.log_level.clone(),
            verbose: self.verbose,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli.args()).context("failed to load configuration")?;

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match &cli.command {
        Commands::Run(_) => commands::run::run(&config).context("run failed")?,
        Commands::Check => commands::check::run(&config)?,
        Commands::Inspect { file } => commands::inspect::run(file)
            .with_context(|| format!("cannot inspect {}", file.display()))?,
    }
    Ok(())
}
