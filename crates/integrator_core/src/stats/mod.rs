//! Running statistics and efficiency drift detection.
//!
//! - [`Accumulator`]: Windowed sums of weighted integrand values
//! - [`RunResult`]: Point estimate and standard error derived from an accumulator
//! - [`EfficiencyMonitor`]: Multiplicative band check against an [`EfficiencyBaseline`]

mod accumulator;
mod efficiency;

pub use accumulator::{Accumulator, RunResult};
pub use efficiency::{
    EfficiencyBand, EfficiencyBaseline, EfficiencyMonitor, EfficiencyStatus,
    DEFAULT_LOWER_FACTOR, DEFAULT_UPPER_FACTOR,
};
