//! Integration driver.
//!
//! - [`DriverConfig`]: validated run parameters
//! - [`RunContext`]: accumulator, checkpoint level, baseline and history
//! - [`IntegrationDriver`]: the sampling loop and the recovery protocol

mod config;
mod context;
mod runner;

pub use config::{
    DriverConfig, DriverConfigBuilder, DEFAULT_CHECK_INTERVAL, DEFAULT_CHECKPOINT_PREFIX,
    DEFAULT_HARD_RESET_AT, DEFAULT_QUALITY_BAR, DEFAULT_RELAXED_SENSITIVITY,
    DEFAULT_TOTAL_ITERATIONS, DEFAULT_VERBOSITY,
};
pub use context::{BoundaryRecord, RunContext};
pub use runner::{IntegrationDriver, RunReport};
