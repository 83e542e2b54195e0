//! The integration driver.
//!
//! Owns the Monte Carlo loop and applies the recovery protocol at every
//! check boundary:
//!
//! ```text
//! for i in 0..total:
//!     sample -> evaluate -> feedback -> accumulate
//!     if i > 0 && i % interval == 0:
//!         classify efficiency -> (drift?) decide -> expand | reset | revert | accept
//!     if i == hard_reset_at:
//!         clear the driver accumulator
//! ```

use super::config::DriverConfig;
use super::context::{BoundaryRecord, RunContext};
use crate::checkpoint::{CheckpointLevel, CheckpointManager};
use crate::error::DriverError;
use crate::recovery::{DecisionProvider, DriftInfo, RecoveryAction, RecoveryPolicy, RunPhase};
use crate::sampler::{AdaptiveSampler, SampleDraw};
use integrator_core::problem::Integrand;
use integrator_core::stats::{EfficiencyMonitor, RunResult};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Summary of a finished run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Iterations performed.
    pub iterations: u64,
    /// Final checkpoint level.
    pub level: usize,
    /// Final efficiency baseline.
    pub baseline: f64,
    /// Sampler estimate over its current statistics window.
    pub sampler_result: Option<RunResult>,
    /// Importance-sampling estimate from the driver's accumulator.
    pub driver_result: Option<RunResult>,
    /// Description of the adapted sampler.
    pub summary: String,
    /// One record per check boundary.
    pub boundaries: Vec<BoundaryRecord>,
}

/// Runs an adaptive sampler against an integrand under the recovery protocol.
///
/// # Type Parameters
///
/// * `S` - Adaptive sampler
/// * `I` - Integrand
/// * `D` - Source of recovery decisions at drifted boundaries
///
/// # Example
///
/// ```rust,no_run
/// use integrator_core::problem::ProblemDefinition;
/// use integrator_engine::driver::{DriverConfig, IntegrationDriver};
/// use integrator_engine::recovery::{FixedDecision, RecoveryAction};
/// use integrator_engine::rng::SamplerRng;
/// use integrator_engine::sampler::{GridSampler, GridSamplerConfig};
///
/// let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();
/// let sampler = GridSampler::new(5, GridSamplerConfig::default(), SamplerRng::from_seed(7)).unwrap();
/// let config = DriverConfig::builder()
///     .total_iterations(2_000_000)
///     .check_interval(200_000)
///     .checkpoint_dir("/tmp/integrator")
///     .build()
///     .unwrap();
///
/// let mut driver = IntegrationDriver::new(
///     config,
///     sampler,
///     problem,
///     FixedDecision::new(RecoveryAction::Accept),
/// )
/// .unwrap();
/// let report = driver.run().unwrap();
/// println!("{:?}", report.driver_result);
/// ```
#[derive(Debug)]
pub struct IntegrationDriver<S, I, D> {
    config: DriverConfig,
    sampler: S,
    integrand: I,
    decisions: D,
    checkpoints: CheckpointManager,
    policy: RecoveryPolicy,
    context: RunContext,
    draw: SampleDraw,
    started: bool,
}

impl<S, I, D> IntegrationDriver<S, I, D>
where
    S: AdaptiveSampler,
    I: Integrand,
    D: DecisionProvider,
{
    /// Creates a driver. The baseline starts at the integrand's expected
    /// efficiency.
    ///
    /// # Errors
    ///
    /// - [`DriverError::DimensionMismatch`] if sampler and integrand disagree
    /// - [`DriverError::Checkpoint`] if the checkpoint directory cannot be created
    pub fn new(config: DriverConfig, sampler: S, integrand: I, decisions: D) -> Result<Self, DriverError> {
        if sampler.dimension() != integrand.dimension() {
            return Err(DriverError::DimensionMismatch {
                sampler: sampler.dimension(),
                integrand: integrand.dimension(),
            });
        }
        config.validate()?;

        let checkpoints = CheckpointManager::new(config.checkpoint_dir(), config.checkpoint_prefix())?;
        let policy = RecoveryPolicy::new(EfficiencyMonitor::new(config.band()));
        let context = RunContext::new(integrand.expected_efficiency());
        let draw = SampleDraw::new(sampler.dimension());

        Ok(Self {
            config,
            sampler,
            integrand,
            decisions,
            checkpoints,
            policy,
            context,
            draw,
            started: false,
        })
    }

    /// Driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run state.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// The sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// The integrand.
    pub fn integrand(&self) -> &I {
        &self.integrand
    }

    /// The decision provider.
    pub fn decisions(&self) -> &D {
        &self.decisions
    }

    /// The checkpoint manager.
    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Current phase of the recovery state machine.
    pub fn phase(&self) -> RunPhase {
        self.policy.phase()
    }

    /// Consumes the driver and returns the sampler.
    pub fn into_sampler(self) -> S {
        self.sampler
    }

    /// Restores the sampler from `path` before the run starts.
    pub fn resume_from(&mut self, path: &Path) -> Result<(), DriverError> {
        self.sampler.restore_checkpoint(path)?;
        info!(path = %path.display(), "Resumed sampler state");
        Ok(())
    }

    /// Prepares the run: applies the sampler verbosity and seeds the level-0
    /// snapshot. Called by [`step`](Self::step) on first use.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.started {
            return Ok(());
        }
        self.sampler.set_verbosity(self.config.verbosity());
        let path = self.checkpoints.checkpoint(&self.sampler, self.context.level)?;
        info!(
            expected_efficiency = self.context.baseline(),
            iterations = self.config.total_iterations(),
            check_interval = self.config.check_interval(),
            seed = %path.display(),
            "Integration started"
        );
        self.started = true;
        Ok(())
    }

    /// Performs one iteration, including the boundary check and the hard
    /// reset when due. Returns the boundary record if one was processed.
    pub fn step(&mut self) -> Result<Option<BoundaryRecord>, DriverError> {
        self.start()?;
        let i = self.context.iteration;

        self.sampler.sample(&mut self.draw);
        let weighted = self.draw.weight * self.integrand.evaluate(&self.draw.point);
        self.sampler.feedback(&self.draw.point, weighted);
        self.context.accumulator.update(weighted);

        let record = if self.config.is_boundary(i) {
            Some(self.boundary(i)?)
        } else {
            None
        };

        if self.config.hard_reset_at() == Some(i) {
            self.context.accumulator.reset();
            info!(iteration = i, "Driver statistics cleared");
        }

        self.context.iteration = i + 1;
        Ok(record)
    }

    /// Runs the remaining iterations and produces the final report.
    pub fn run(&mut self) -> Result<RunReport, DriverError> {
        self.start()?;
        while self.context.iteration < self.config.total_iterations() {
            self.step()?;
        }
        self.finish()
    }

    /// Persists the canonical snapshot and summarises the run.
    pub fn finish(&mut self) -> Result<RunReport, DriverError> {
        self.checkpoints.save_canonical(&self.sampler)?;

        let summary = self.sampler.describe();
        let sampler_result = self.sampler.estimate().ok();
        let driver_result = self.context.accumulator.estimate().ok();

        info!("{summary}");
        if let Some(r) = &sampler_result {
            info!(
                estimate = r.mean,
                error = r.std_error,
                efficiency = r.efficiency,
                "Sampler result"
            );
        }
        match &driver_result {
            Some(r) => info!(
                estimate = r.mean,
                error = r.std_error,
                efficiency = r.efficiency,
                samples = r.count,
                "Importance-sampling result"
            ),
            None => warn!("No samples accumulated since the last statistics reset"),
        }

        Ok(RunReport {
            iterations: self.context.iteration,
            level: self.context.level.value(),
            baseline: self.context.baseline(),
            sampler_result,
            driver_result,
            summary,
            boundaries: self.context.history.clone(),
        })
    }

    fn boundary(&mut self, iteration: u64) -> Result<BoundaryRecord, DriverError> {
        self.report_progress(iteration);

        let measured = self.sampler.efficiency();
        let expected = self.context.baseline();

        self.policy.begin_check()?;
        let info = DriftInfo {
            iteration,
            level: self.context.level.value(),
            expected,
            measured,
            status: self.policy.classify(measured, expected),
        };
        let action = self.policy.resolve(&info, &mut self.decisions)?;

        let changes = match action {
            RecoveryAction::Expand => {
                debug!(iteration, "Expanding statistics window");
                None
            }
            RecoveryAction::Reset => {
                self.reset_statistics();
                None
            }
            RecoveryAction::Revert => {
                let from = self.context.level;
                let to = self.checkpoints.revert(&mut self.sampler, &mut self.context.level)?;
                self.reset_statistics();
                info!(from = from.value(), to = to.value(), "Reverted to previous checkpoint");
                None
            }
            RecoveryAction::Accept => Some(self.accept(measured)?),
        };
        self.policy.finish()?;

        let record = BoundaryRecord {
            iteration,
            measured,
            baseline: expected,
            status: info.status,
            action,
            changes,
            level: self.context.level.value(),
        };
        self.context.history.push(record);
        Ok(record)
    }

    /// Checkpoints the current level, adapts, and advances the level.
    fn accept(&mut self, measured: f64) -> Result<usize, DriverError> {
        let level: CheckpointLevel = self.context.level;
        self.checkpoints.checkpoint(&self.sampler, level)?;

        let changes = self.sampler.adapt();
        if changes > 0 {
            self.checkpoints.save_canonical(&self.sampler)?;
            let efficiency = self.sampler.efficiency();
            self.context.baseline.accept(efficiency);
            self.reset_statistics();
            info!(changes, baseline = efficiency, "Sampler adapted");
        } else {
            debug!("Adaptation left the sampler unchanged");
        }

        if measured > self.config.quality_bar() {
            self.sampler
                .set_adaptation_sensitivity(self.config.relaxed_sensitivity());
        }

        let next = self.context.level.advance();
        debug!(level = next.value(), "Checkpoint level advanced");
        Ok(changes)
    }

    fn reset_statistics(&mut self) {
        self.sampler.reset_statistics();
        self.context.accumulator.reset();
    }

    fn report_progress(&self, iteration: u64) {
        match self.sampler.estimate() {
            Ok(r) => info!(
                iteration,
                estimate = r.mean,
                error = r.std_error,
                ess = self.sampler.effective_sample_count(),
                samples = self.sampler.sample_count(),
                "Boundary reached"
            ),
            Err(_) => info!(iteration, "Boundary reached with no sampler statistics"),
        }
    }
}
