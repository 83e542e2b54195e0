//! Checkpoint level counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persisted sampler snapshot.
///
/// Levels grow by one with every accepted checkpoint. A revert moves one
/// level back and never goes below zero.
///
/// # Example
///
/// ```rust
/// use integrator_engine::checkpoint::CheckpointLevel;
///
/// let mut level = CheckpointLevel::default();
/// assert!(!level.retreat());
/// assert_eq!(level.value(), 0);
///
/// level.advance();
/// level.advance();
/// assert!(level.retreat());
/// assert_eq!(level.value(), 1);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckpointLevel(usize);

impl CheckpointLevel {
    /// Creates a level with the given value.
    #[inline]
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    /// Numeric value of the level.
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }

    /// Returns true at level zero.
    #[inline]
    pub fn is_floor(&self) -> bool {
        self.0 == 0
    }

    /// Moves to the next level and returns it.
    #[inline]
    pub fn advance(&mut self) -> Self {
        self.0 += 1;
        *self
    }

    /// Moves one level back. Returns false (and stays put) at level zero.
    #[inline]
    pub fn retreat(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

impl fmt::Display for CheckpointLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
