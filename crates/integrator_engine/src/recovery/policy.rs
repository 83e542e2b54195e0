//! Boundary state machine.

use super::action::RecoveryAction;
use super::provider::{DecisionProvider, RecoveryError};
use integrator_core::stats::{EfficiencyMonitor, EfficiencyStatus};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Phase of the integration run with respect to the recovery protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RunPhase {
    /// Sampling between boundaries.
    Running,
    /// Classifying the efficiency at a boundary.
    Checking,
    /// Keeping the current statistics window.
    Expanding,
    /// Clearing statistics at the current level.
    Resetting,
    /// Rolling back to the previous level.
    Reverting,
    /// Checkpointing and adapting.
    Accepting,
}

impl RunPhase {
    /// Phase entered when `action` is applied.
    pub fn for_action(action: RecoveryAction) -> Self {
        match action {
            RecoveryAction::Expand => RunPhase::Expanding,
            RecoveryAction::Reset => RunPhase::Resetting,
            RecoveryAction::Revert => RunPhase::Reverting,
            RecoveryAction::Accept => RunPhase::Accepting,
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Running, Checking)
                | (Checking, Expanding)
                | (Checking, Resetting)
                | (Checking, Reverting)
                | (Checking, Accepting)
                | (Expanding, Running)
                | (Resetting, Running)
                | (Reverting, Running)
                | (Accepting, Running)
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Running => "running",
            RunPhase::Checking => "checking",
            RunPhase::Expanding => "expanding",
            RunPhase::Resetting => "resetting",
            RunPhase::Reverting => "reverting",
            RunPhase::Accepting => "accepting",
        };
        f.write_str(name)
    }
}

/// What the decision provider is told about a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DriftInfo {
    /// Global iteration of the boundary.
    pub iteration: u64,
    /// Current checkpoint level.
    pub level: usize,
    /// Baseline efficiency.
    pub expected: f64,
    /// Efficiency reported by the sampler.
    pub measured: f64,
    /// Classification of `measured` against `expected`.
    pub status: EfficiencyStatus,
}

/// Applies the recovery protocol at check boundaries.
#[derive(Debug)]
pub struct RecoveryPolicy {
    monitor: EfficiencyMonitor,
    phase: RunPhase,
}

impl RecoveryPolicy {
    /// Creates a policy in the [`RunPhase::Running`] phase.
    pub fn new(monitor: EfficiencyMonitor) -> Self {
        Self {
            monitor,
            phase: RunPhase::Running,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The efficiency monitor in use.
    pub fn monitor(&self) -> &EfficiencyMonitor {
        &self.monitor
    }

    /// Classifies a measurement against the baseline.
    pub fn classify(&self, measured: f64, expected: f64) -> EfficiencyStatus {
        self.monitor.classify(measured, expected)
    }

    /// Enters [`RunPhase::Checking`].
    pub fn begin_check(&mut self) -> Result<(), RecoveryError> {
        self.transition(RunPhase::Checking)
    }

    /// Chooses the action for a boundary.
    ///
    /// Without drift the boundary is accepted and `provider` is not
    /// consulted. Must be called in [`RunPhase::Checking`].
    pub fn resolve<D>(&mut self, info: &DriftInfo, provider: &mut D) -> Result<RecoveryAction, RecoveryError>
    where
        D: DecisionProvider + ?Sized,
    {
        if self.phase != RunPhase::Checking {
            return Err(RecoveryError::IllegalTransition {
                from: self.phase,
                to: RunPhase::Checking,
            });
        }

        let action = if info.status.is_drifted() {
            warn!(
                iteration = info.iteration,
                level = info.level,
                expected = info.expected,
                measured = info.measured,
                "Efficiency drifted"
            );
            provider.decide(info)?
        } else {
            RecoveryAction::Accept
        };

        self.transition(RunPhase::for_action(action))?;
        debug!(action = %action, phase = %self.phase, "Recovery action chosen");
        Ok(action)
    }

    /// Returns to [`RunPhase::Running`] once the action has been applied.
    pub fn finish(&mut self) -> Result<(), RecoveryError> {
        self.transition(RunPhase::Running)
    }

    fn transition(&mut self, next: RunPhase) -> Result<(), RecoveryError> {
        if !self.phase.can_transition_to(next) {
            return Err(RecoveryError::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(EfficiencyMonitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::{FixedDecision, ScriptedDecisions};

    fn info(measured: f64, status: EfficiencyStatus) -> DriftInfo {
        DriftInfo {
            iteration: 100,
            level: 2,
            expected: 0.05,
            measured,
            status,
        }
    }

    // ========================================
    // Phase transitions
    // ========================================

    #[test]
    fn test_legal_cycle() {
        let mut policy = RecoveryPolicy::default();
        assert_eq!(policy.phase(), RunPhase::Running);
        policy.begin_check().unwrap();
        assert_eq!(policy.phase(), RunPhase::Checking);

        let mut provider = FixedDecision::new(RecoveryAction::Reset);
        let status = policy.classify(0.02, 0.05);
        let action = policy.resolve(&info(0.02, status), &mut provider).unwrap();
        assert_eq!(action, RecoveryAction::Reset);
        assert_eq!(policy.phase(), RunPhase::Resetting);

        policy.finish().unwrap();
        assert_eq!(policy.phase(), RunPhase::Running);
    }

    #[test]
    fn test_resolve_outside_check_is_rejected() {
        let mut policy = RecoveryPolicy::default();
        let mut provider = FixedDecision::new(RecoveryAction::Accept);
        let err = policy
            .resolve(&info(0.05, EfficiencyStatus::InRange), &mut provider)
            .unwrap_err();
        assert!(matches!(err, RecoveryError::IllegalTransition { from: RunPhase::Running, .. }));
    }

    #[test]
    fn test_double_check_is_rejected() {
        let mut policy = RecoveryPolicy::default();
        policy.begin_check().unwrap();
        assert!(policy.begin_check().is_err());
        assert!(policy.finish().is_err());
    }

    #[test]
    fn test_transition_table() {
        use RunPhase::*;
        for action in RecoveryAction::ALL {
            let phase = RunPhase::for_action(action);
            assert!(Checking.can_transition_to(phase));
            assert!(phase.can_transition_to(Running));
            assert!(!Running.can_transition_to(phase));
        }
        assert!(!Checking.can_transition_to(Running));
    }

    // ========================================
    // Decisions
    // ========================================

    #[test]
    fn test_in_range_accepts_without_consulting_provider() {
        let mut policy = RecoveryPolicy::default();
        let mut provider = ScriptedDecisions::new(Vec::new());
        policy.begin_check().unwrap();

        let action = policy
            .resolve(&info(0.06, EfficiencyStatus::InRange), &mut provider)
            .unwrap();

        assert_eq!(action, RecoveryAction::Accept);
        assert_eq!(policy.phase(), RunPhase::Accepting);
        assert!(provider.consulted().is_empty());
    }

    #[test]
    fn test_drift_consults_provider() {
        let mut policy = RecoveryPolicy::default();
        let mut provider = ScriptedDecisions::new(vec![RecoveryAction::Revert]);
        policy.begin_check().unwrap();

        let drift = info(0.02, EfficiencyStatus::Drifted);
        let action = policy.resolve(&drift, &mut provider).unwrap();

        assert_eq!(action, RecoveryAction::Revert);
        assert_eq!(provider.consulted(), &[drift]);
    }

    #[test]
    fn test_provider_error_keeps_checking_phase() {
        let mut policy = RecoveryPolicy::default();
        let mut provider = ScriptedDecisions::new(Vec::new());
        policy.begin_check().unwrap();

        let err = policy
            .resolve(&info(0.02, EfficiencyStatus::Drifted), &mut provider)
            .unwrap_err();
        assert!(matches!(err, RecoveryError::ScriptExhausted { iteration: 100 }));
        assert_eq!(policy.phase(), RunPhase::Checking);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn phase_strategy() -> impl Strategy<Value = RunPhase> {
            prop_oneof![
                Just(RunPhase::Running),
                Just(RunPhase::Checking),
                Just(RunPhase::Expanding),
                Just(RunPhase::Resetting),
                Just(RunPhase::Reverting),
                Just(RunPhase::Accepting),
            ]
        }

        fn action_strategy() -> impl Strategy<Value = RecoveryAction> {
            prop::sample::select(RecoveryAction::ALL.to_vec())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn test_no_phase_loops_onto_itself(phase in phase_strategy()) {
                prop_assert!(!phase.can_transition_to(phase));
            }

            #[test]
            fn test_running_only_enters_checking(next in phase_strategy()) {
                prop_assert_eq!(
                    RunPhase::Running.can_transition_to(next),
                    next == RunPhase::Checking
                );
            }

            #[test]
            fn test_action_phases_return_to_running(
                action in action_strategy(),
                next in phase_strategy(),
            ) {
                let phase = RunPhase::for_action(action);
                prop_assert!(RunPhase::Checking.can_transition_to(phase));
                prop_assert_eq!(phase.can_transition_to(next), next == RunPhase::Running);
            }

            #[test]
            fn test_drifted_boundary_follows_provider(
                actions in prop::collection::vec(action_strategy(), 1..20),
            ) {
                let mut policy = RecoveryPolicy::default();
                for action in actions {
                    policy.begin_check().unwrap();
                    let chosen = policy
                        .resolve(&info(0.001, EfficiencyStatus::Drifted), &mut FixedDecision::new(action))
                        .unwrap();
                    prop_assert_eq!(chosen, action);
                    prop_assert_eq!(policy.phase(), RunPhase::for_action(action));
                    policy.finish().unwrap();
                    prop_assert_eq!(policy.phase(), RunPhase::Running);
                }
            }
        }
    }
}
