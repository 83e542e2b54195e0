//! # Uniform Random Source
//!
//! The sampler consumes uniform variates on [0, 1) through the
//! [`UniformSource`] trait. [`SamplerRng`] is the seeded default.
//!
//! ## Design
//!
//! - **Reproducibility**: generators are seeded from a `u64`
//! - **Efficiency**: batch generation into caller-owned `&mut [f64]` buffers
//! - **Static dispatch**: samplers are generic over the source
//!
//! ## Usage Example
//!
//! ```rust
//! use integrator_engine::rng::{SamplerRng, UniformSource};
//!
//! let mut rng = SamplerRng::from_seed(12345);
//! let mut buffer = vec![0.0; 5];
//! rng.fill_uniform(&mut buffer);
//! assert!(buffer.iter().all(|u| (0.0..1.0).contains(u)));
//! ```

mod prng;

pub use prng::SamplerRng;

/// A source of uniform variates on [0, 1).
pub trait UniformSource {
    /// Fills `buffer` with independent uniform variates.
    fn fill_uniform(&mut self, buffer: &mut [f64]);
}

impl<U: UniformSource + ?Sized> UniformSource for &mut U {
    #[inline]
    fn fill_uniform(&mut self, buffer: &mut [f64]) {
        (**self).fill_uniform(buffer)
    }
}
