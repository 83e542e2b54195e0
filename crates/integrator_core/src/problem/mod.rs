//! Integrand contract and the reference correlated-Gaussian problem.
//!
//! The integrand is a pure function on the unit hypercube. It carries the
//! closed-form efficiency an unbiased uniform proposal would achieve, which
//! the driver uses as the initial efficiency baseline.

mod gaussian;

pub use gaussian::ProblemDefinition;

/// A pure integrand on the D-dimensional unit cube.
pub trait Integrand {
    /// Number of integration dimensions.
    fn dimension(&self) -> usize;

    /// Evaluates the integrand at `point` (length `dimension()`).
    fn evaluate(&self, point: &[f64]) -> f64;

    /// Efficiency expected from an unbiased uniform proposal.
    fn expected_efficiency(&self) -> f64;
}
