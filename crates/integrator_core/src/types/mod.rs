//! Shared types for the integrator foundation layer.

pub mod error;

pub use error::{ProblemError, StatsError};
