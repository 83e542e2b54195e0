//! Mutable state of one integration run.

use crate::checkpoint::CheckpointLevel;
use crate::recovery::RecoveryAction;
use integrator_core::stats::{Accumulator, EfficiencyBaseline, EfficiencyStatus};
use serde::Serialize;

/// Outcome of one check boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundaryRecord {
    /// Global iteration of the boundary.
    pub iteration: u64,
    /// Efficiency reported by the sampler.
    pub measured: f64,
    /// Baseline the measurement was compared with.
    pub baseline: f64,
    /// Classification of the measurement.
    pub status: EfficiencyStatus,
    /// Action applied.
    pub action: RecoveryAction,
    /// Regions modified by adaptation (accept path only).
    pub changes: Option<usize>,
    /// Checkpoint level after the action.
    pub level: usize,
}

/// Run state owned by the driver: the importance-sampling accumulator, the
/// checkpoint level, the efficiency baseline and the boundary history.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub(crate) accumulator: Accumulator,
    pub(crate) level: CheckpointLevel,
    pub(crate) baseline: EfficiencyBaseline,
    pub(crate) iteration: u64,
    pub(crate) history: Vec<BoundaryRecord>,
}

impl RunContext {
    /// Fresh context at level 0 with the given baseline.
    pub fn new(baseline: f64) -> Self {
        Self {
            accumulator: Accumulator::new(),
            level: CheckpointLevel::default(),
            baseline: EfficiencyBaseline::new(baseline),
            iteration: 0,
            history: Vec::new(),
        }
    }

    /// Importance-sampling statistics of the current window.
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Current checkpoint level.
    pub fn level(&self) -> CheckpointLevel {
        self.level
    }

    /// Current efficiency baseline.
    pub fn baseline(&self) -> f64 {
        self.baseline.value()
    }

    /// Number of iterations completed.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Boundaries processed so far.
    pub fn history(&self) -> &[BoundaryRecord] {
        &self.history
    }
}
