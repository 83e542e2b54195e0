//! Checkpoint manager for persisting sampler state at numbered levels.
//!
//! Snapshots live in one directory with deterministic names:
//!
//! ```text
//! <dir>/<prefix>_<level>.astate   one per checkpoint level
//! <dir>/<prefix>.astate           canonical "latest accepted" state
//! ```

use super::level::CheckpointLevel;
use crate::sampler::AdaptiveSampler;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File extension of sampler snapshots.
pub const CHECKPOINT_EXTENSION: &str = "astate";

/// Errors that can occur during checkpoint operations.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint exists at the requested level.
    #[error("Checkpoint not found for level {level}")]
    NotFound {
        /// The level that was requested
        level: usize,
    },

    /// A snapshot file does not exist.
    #[error("Checkpoint file {} does not exist", .path.display())]
    MissingFile {
        /// Path that was requested
        path: PathBuf,
    },

    /// Reading or writing a snapshot failed.
    #[error("Checkpoint I/O failed for {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("Checkpoint serialisation failed for {}: {source}", .path.display())]
    Serialisation {
        /// Path being accessed
        path: PathBuf,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot format version is not understood.
    #[error("Unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// The snapshot does not fit the sampler it is restored into.
    #[error("Incompatible snapshot: {message}")]
    Incompatible {
        /// Description of the mismatch
        message: String,
    },
}

/// Result type for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Persists and restores sampler snapshots keyed by [`CheckpointLevel`].
///
/// # Example
///
/// ```rust
/// use integrator_engine::checkpoint::{CheckpointLevel, CheckpointManager};
/// use integrator_engine::rng::SamplerRng;
/// use integrator_engine::sampler::{GridSampler, GridSamplerConfig};
///
/// let dir = tempfile::tempdir().unwrap();
/// let manager = CheckpointManager::new(dir.path(), "doc").unwrap();
/// let mut sampler = GridSampler::new(2, GridSamplerConfig::default(), SamplerRng::from_seed(1)).unwrap();
///
/// let mut level = CheckpointLevel::new(0);
/// manager.checkpoint(&sampler, level).unwrap();
/// level.advance();
///
/// // Revert moves back to level 0 and restores its snapshot.
/// manager.revert(&mut sampler, &mut level).unwrap();
/// assert_eq!(level.value(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct CheckpointManager {
    directory: PathBuf,
    prefix: String,
}

impl CheckpointManager {
    /// Creates a manager writing into `directory` (created if missing).
    ///
    /// # Errors
    ///
    /// [`CheckpointError::Io`] if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> CheckpointResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| CheckpointError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self {
            directory,
            prefix: prefix.into(),
        })
    }

    /// Directory holding the snapshots.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File-name prefix of the snapshots.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the snapshot for `level`.
    pub fn level_path(&self, level: CheckpointLevel) -> PathBuf {
        self.directory.join(format!(
            "{}_{}.{}",
            self.prefix,
            level.value(),
            CHECKPOINT_EXTENSION
        ))
    }

    /// Path of the canonical "latest accepted" snapshot.
    pub fn canonical_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.prefix, CHECKPOINT_EXTENSION))
    }

    /// Returns true if a snapshot exists for `level`.
    pub fn has_checkpoint(&self, level: CheckpointLevel) -> bool {
        self.level_path(level).is_file()
    }

    /// Persists the sampler under `level`, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Any write failure. Callers treat this as fatal.
    pub fn checkpoint<S: AdaptiveSampler + ?Sized>(
        &self,
        sampler: &S,
        level: CheckpointLevel,
    ) -> CheckpointResult<PathBuf> {
        let path = self.level_path(level);
        sampler.save_checkpoint(&path)?;
        debug!(level = level.value(), path = %path.display(), "Checkpoint saved");
        Ok(path)
    }

    /// Restores the sampler from the snapshot at `level`.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::NotFound`] if no snapshot exists at `level`.
    pub fn restore<S: AdaptiveSampler + ?Sized>(
        &self,
        sampler: &mut S,
        level: CheckpointLevel,
    ) -> CheckpointResult<()> {
        let path = self.level_path(level);
        if !path.is_file() {
            return Err(CheckpointError::NotFound {
                level: level.value(),
            });
        }
        sampler.restore_checkpoint(&path)?;
        debug!(level = level.value(), "Checkpoint restored");
        Ok(())
    }

    /// Decrements `level` (not below zero) and restores that snapshot.
    ///
    /// Returns the level now active. On error `level` is left unchanged.
    pub fn revert<S: AdaptiveSampler + ?Sized>(
        &self,
        sampler: &mut S,
        level: &mut CheckpointLevel,
    ) -> CheckpointResult<CheckpointLevel> {
        let mut target = *level;
        target.retreat();
        self.restore(sampler, target)?;
        *level = target;
        Ok(target)
    }

    /// Overwrites the canonical "latest accepted" snapshot.
    pub fn save_canonical<S: AdaptiveSampler + ?Sized>(&self, sampler: &S) -> CheckpointResult<PathBuf> {
        let path = self.canonical_path();
        sampler.save_checkpoint(&path)?;
        debug!(path = %path.display(), "Canonical checkpoint saved");
        Ok(path)
    }

    /// Restores the sampler from the canonical snapshot.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::MissingFile`] if no canonical snapshot exists.
    pub fn restore_canonical<S: AdaptiveSampler + ?Sized>(&self, sampler: &mut S) -> CheckpointResult<()> {
        let path = self.canonical_path();
        if !path.is_file() {
            return Err(CheckpointError::MissingFile { path });
        }
        sampler.restore_checkpoint(&path)
    }
}
