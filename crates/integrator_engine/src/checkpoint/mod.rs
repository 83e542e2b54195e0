//! Checkpointing of sampler state at numbered levels.
//!
//! The driver persists the sampler before every adaptation so that a bad
//! update can be rolled back. Snapshots are files keyed by level, plus one
//! canonical "latest accepted" file that is overwritten after each successful
//! adaptation and serves as the restart point after process termination.
//!
//! # Key Components
//!
//! - [`CheckpointLevel`]: Monotone level counter with a floor at zero
//! - [`CheckpointManager`]: Save, restore and revert against a directory
//! - [`write_snapshot`] / [`read_snapshot`]: Versioned JSON envelopes used by
//!   sampler implementations
//!
//! # Example
//!
//! ```rust,ignore
//! use integrator_engine::checkpoint::{CheckpointLevel, CheckpointManager};
//!
//! let manager = CheckpointManager::new("./checkpoints", "ex")?;
//! let mut level = CheckpointLevel::default();
//!
//! manager.checkpoint(&sampler, level)?;   // writes ./checkpoints/ex_0.astate
//! level.advance();
//!
//! // Roll back the last update
//! manager.revert(&mut sampler, &mut level)?;
//! ```

mod level;
mod manager;
mod snapshot;

pub use level::CheckpointLevel;
pub use manager::{CheckpointError, CheckpointManager, CheckpointResult, CHECKPOINT_EXTENSION};
pub use snapshot::{
    read_snapshot, read_snapshot_header, write_snapshot, SnapshotEnvelope, SnapshotHeader,
    SNAPSHOT_FORMAT_VERSION,
};
