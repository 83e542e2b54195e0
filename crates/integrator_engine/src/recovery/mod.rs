//! Drift recovery protocol.
//!
//! At every check boundary the driver classifies the sampler's efficiency.
//! Without drift the boundary is accepted automatically. With drift a
//! [`DecisionProvider`] chooses one of four [`RecoveryAction`]s:
//!
//! | Action | Key | Effect |
//! |--------|-----|--------|
//! | Expand | `e` | keep accumulating into the same window |
//! | Reset  | `r` | clear statistics, stay at the current level |
//! | Revert | `b` | step back one level, restore it, clear statistics |
//! | Accept | `a` | checkpoint and adapt regardless of drift |
//!
//! [`RecoveryPolicy`] tracks the boundary state machine:
//!
//! ```text
//! Running -> Checking -> {Expanding | Resetting | Reverting | Accepting} -> Running
//! ```

mod action;
mod policy;
mod provider;

pub use action::{ParseActionError, RecoveryAction};
pub use policy::{DriftInfo, RecoveryPolicy, RunPhase};
pub use provider::{DecisionProvider, FixedDecision, PromptDecisions, RecoveryError, ScriptedDecisions};
