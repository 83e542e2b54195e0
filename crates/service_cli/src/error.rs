//! CLI error types

use integrator_core::types::ProblemError;
use integrator_engine::checkpoint::CheckpointError;
use integrator_engine::DriverError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Problem definition error: {0}")]
    Problem(#[from] ProblemError),

    #[error("Sampler setup error: {0}")]
    Sampler(#[from] integrator_engine::ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Integration failed: {0}")]
    Driver(#[from] DriverError),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Result alias for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
