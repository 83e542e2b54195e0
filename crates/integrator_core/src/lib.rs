//! # integrator_core: Statistical Foundation for Adaptive Importance Sampling
//!
//! ## Layer 1 (Foundation) Role
//!
//! integrator_core is the bottom layer of the integrator workspace, providing:
//! - Running weighted-value statistics (`stats::Accumulator`)
//! - Efficiency drift classification (`stats::EfficiencyMonitor`)
//! - The integrand contract and the correlated-Gaussian oracle (`problem`)
//! - Error types: `StatsError`, `ProblemError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other integrator_* crates, with minimal external dependencies:
//! - num-traits: Generic floating-point arithmetic for the accumulator
//! - thiserror: Structured error types
//! - serde: Serialisation of statistics and problem definitions
//!
//! ## Usage Examples
//!
//! ```rust
//! use integrator_core::problem::{Integrand, ProblemDefinition};
//! use integrator_core::stats::{Accumulator, EfficiencyMonitor, EfficiencyStatus};
//!
//! let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();
//! assert_eq!(problem.dimension(), 5);
//!
//! let mut acc: Accumulator = Accumulator::new();
//! acc.update(1.0);
//! acc.update(3.0);
//! let result = acc.estimate().unwrap();
//! assert_eq!(result.mean, 2.0);
//!
//! let monitor = EfficiencyMonitor::default();
//! assert_eq!(monitor.classify(0.06, 0.05), EfficiencyStatus::InRange);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod problem;
pub mod stats;
pub mod types;
