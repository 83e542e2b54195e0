//! # integrator_engine: Adaptive Importance-Sampling Driver
//!
//! ## Layer 2 Role
//!
//! integrator_engine builds on integrator_core and provides:
//! - The adaptive sampler contract and a VEGAS-style grid sampler (`sampler`)
//! - Seeded uniform sources (`rng`)
//! - Numbered and canonical sampler snapshots (`checkpoint`)
//! - The drift recovery protocol and its decision providers (`recovery`)
//! - The Monte Carlo loop that ties them together (`driver`)
//!
//! ## Run Protocol
//!
//! ```text
//! per iteration:  sample -> integrand -> feedback -> accumulate
//! per boundary:   classify efficiency
//!                 in range -> accept
//!                 drifted  -> DecisionProvider: expand | reset | revert | accept
//! accept:         checkpoint(level) -> adapt -> (changed) canonical + baseline + reset
//!                 -> level + 1
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use integrator_core::problem::ProblemDefinition;
//! use integrator_engine::driver::{DriverConfig, IntegrationDriver};
//! use integrator_engine::recovery::PromptDecisions;
//! use integrator_engine::rng::SamplerRng;
//! use integrator_engine::sampler::{GridSampler, GridSamplerConfig};
//!
//! let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();
//! let sampler = GridSampler::new(5, GridSamplerConfig::default(), SamplerRng::from_seed(42)).unwrap();
//! let config = DriverConfig::builder().checkpoint_prefix("ex").build().unwrap();
//!
//! let mut driver = IntegrationDriver::new(config, sampler, problem, PromptDecisions::stdio()).unwrap();
//! let report = driver.run().unwrap();
//! println!("level {} baseline {:.4}", report.level, report.baseline);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod checkpoint;
pub mod driver;
pub mod error;
pub mod recovery;
pub mod rng;
pub mod sampler;

pub use driver::{DriverConfig, IntegrationDriver, RunReport};
pub use error::{ConfigError, DriverError};
