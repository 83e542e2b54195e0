//! Adaptive importance-sampler contract.
//!
//! The driver treats the sampler as an opaque capability: it draws weighted
//! points, learns from feedback, occasionally restructures itself, reports
//! its running statistics and persists its state to files. Any adaptive
//! scheme (tree stratification, VEGAS-style grids, ...) can sit behind
//! [`AdaptiveSampler`] without changes to the driver.
//!
//! # Architecture
//!
//! ```text
//! AdaptiveSampler
//! ├── sample()            -> SampleDraw (point in [0,1)^D, importance weight)
//! ├── feedback()          <- weighted integrand value
//! ├── adapt()             -> number of modified regions (0 = no-op)
//! ├── reporting           efficiency / sample counts / estimate
//! └── persistence         save_checkpoint / restore_checkpoint
//! ```
//!
//! [`GridSampler`] is the bundled implementation.

mod grid;

pub use grid::{GridSampler, GridSamplerConfig, GRID_SAMPLER_KIND};

use crate::checkpoint::CheckpointResult;
use integrator_core::stats::RunResult;
use integrator_core::types::StatsError;
use std::path::Path;

/// A point drawn by the sampler together with its importance weight.
///
/// The buffer is reused across iterations; its contents are only valid
/// until the next call to [`AdaptiveSampler::sample`].
#[derive(Clone, Debug, PartialEq)]
pub struct SampleDraw {
    /// Coordinates in the unit hypercube.
    pub point: Vec<f64>,
    /// Importance weight (inverse proposal density).
    pub weight: f64,
}

impl SampleDraw {
    /// Allocates a draw buffer for `dimension` coordinates.
    pub fn new(dimension: usize) -> Self {
        Self {
            point: vec![0.0; dimension],
            weight: 0.0,
        }
    }
}

/// Capability interface of an adaptive importance sampler.
pub trait AdaptiveSampler {
    /// Number of dimensions of the sampling domain.
    fn dimension(&self) -> usize;

    /// Draws one point and its weight into `draw`.
    fn sample(&mut self, draw: &mut SampleDraw);

    /// Reports the weighted integrand value observed at `point`.
    fn feedback(&mut self, point: &[f64], weighted_value: f64);

    /// Requests structural adaptation. Returns the number of modified
    /// regions; zero means nothing changed.
    fn adapt(&mut self) -> usize;

    /// Effective number of independent samples in the running statistics.
    fn effective_sample_count(&self) -> f64;

    /// Number of samples in the running statistics.
    fn sample_count(&self) -> u64;

    /// Effective-sample-size efficiency.
    fn efficiency(&self) -> f64 {
        match self.sample_count() {
            0 => 0.0,
            n => self.effective_sample_count() / n as f64,
        }
    }

    /// Running estimate of the integral.
    ///
    /// # Errors
    ///
    /// [`StatsError::InsufficientData`] when no feedback has been received
    /// since the last statistics reset.
    fn estimate(&self) -> Result<RunResult, StatsError>;

    /// Persists the full sampler state to `path`.
    fn save_checkpoint(&self, path: &Path) -> CheckpointResult<()>;

    /// Replaces the sampler state with the one stored at `path`.
    fn restore_checkpoint(&mut self, path: &Path) -> CheckpointResult<()>;

    /// Clears the running totals (not the adaptive structure).
    fn reset_statistics(&mut self);

    /// Sets the diagnostic verbosity for subsequent calls.
    fn set_verbosity(&mut self, level: u8);

    /// Sets the amount of training data required before [`adapt`](Self::adapt)
    /// may restructure the sampler.
    fn set_adaptation_sensitivity(&mut self, threshold: u64);

    /// Human-readable summary of the adaptive structure.
    fn describe(&self) -> String;
}
