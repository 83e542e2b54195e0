//! Error types for the integration engine.
//!
//! - [`ConfigError`]: invalid driver or sampler parameters, raised at construction
//! - [`DriverError`]: failures that abort a run

use crate::checkpoint::CheckpointError;
use crate::recovery::RecoveryError;
use integrator_core::types::StatsError;
use thiserror::Error;

/// Configuration error for the driver and samplers.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Total iteration count must be positive.
    #[error("Invalid iteration count {0}: must be at least 1")]
    InvalidIterationCount(u64),

    /// Check interval must be positive.
    #[error("Invalid check interval {0}: must be at least 1")]
    InvalidCheckInterval(u64),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// Efficiency band factors are out of order.
    #[error(transparent)]
    Band(#[from] StatsError),
}

/// Errors that abort an integration run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkpoint persistence or restore failed; the run cannot continue.
    #[error("Checkpoint failure: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// No recovery decision could be obtained.
    #[error("Recovery failure: {0}")]
    Recovery(#[from] RecoveryError),

    /// Sampler and integrand disagree on dimensionality.
    #[error("Sampler has dimension {sampler} but integrand has dimension {integrand}")]
    DimensionMismatch {
        /// Sampler dimension
        sampler: usize,
        /// Integrand dimension
        integrand: usize,
    },
}
