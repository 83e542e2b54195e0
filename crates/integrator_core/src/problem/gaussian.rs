//! Correlated Gaussian ellipsoid on the unit hypercube.
//!
//! The integrand is
//!
//! ```text
//! I(u) = exp(-½ Σᵢ ((Σⱼ Aᵢⱼ uⱼ − μᵢ) / σᵢ)²) / gnorm
//! gnorm = (1 / |det A|) · Πᵢ sqrt(2π) σᵢ
//! ```
//!
//! so that its integral over the cube is one whenever the ellipsoid lies well
//! inside the domain. Against a uniform proposal the efficiency
//! `(∫I)² / ∫I²` evaluates to `gnorm · 2^(D/2)`.

use super::Integrand;
use crate::types::ProblemError;
use serde::Serialize;
use std::f64::consts::PI;

/// Immutable definition of a correlated Gaussian integration problem.
///
/// # Example
///
/// ```rust
/// use integrator_core::problem::{Integrand, ProblemDefinition};
///
/// let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();
/// assert!((problem.jacobian() - 120.0).abs() < 1e-9);
/// assert!(problem.expected_efficiency() > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProblemDefinition {
    axes: Vec<Vec<f64>>,
    mean: Vec<f64>,
    sigma: Vec<f64>,
    jacobian: f64,
    gnorm: f64,
    expected_efficiency: f64,
}

impl ProblemDefinition {
    /// Builds a problem from its axis transform, means and widths.
    ///
    /// The jacobian is derived as `|det axes|`.
    ///
    /// # Errors
    ///
    /// - [`ProblemError::EmptyProblem`] for zero dimensions
    /// - [`ProblemError::DimensionMismatch`] if shapes disagree
    /// - [`ProblemError::InvalidSigma`] for non-positive widths
    /// - [`ProblemError::SingularAxes`] if the transform is singular
    pub fn new(axes: Vec<Vec<f64>>, mean: Vec<f64>, sigma: Vec<f64>) -> Result<Self, ProblemError> {
        let dim = axes.len();
        if dim == 0 {
            return Err(ProblemError::EmptyProblem);
        }
        for row in &axes {
            if row.len() != dim {
                return Err(ProblemError::DimensionMismatch {
                    field: "axes",
                    expected: dim,
                    actual: row.len(),
                });
            }
        }
        if mean.len() != dim {
            return Err(ProblemError::DimensionMismatch {
                field: "mean",
                expected: dim,
                actual: mean.len(),
            });
        }
        if sigma.len() != dim {
            return Err(ProblemError::DimensionMismatch {
                field: "sigma",
                expected: dim,
                actual: sigma.len(),
            });
        }
        if let Some((index, &value)) = sigma
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(ProblemError::InvalidSigma { index, value });
        }

        let jacobian = determinant(&axes).abs();
        if jacobian < f64::EPSILON {
            return Err(ProblemError::SingularAxes);
        }

        let gnorm = sigma
            .iter()
            .fold(1.0 / jacobian, |acc, s| acc * (2.0 * PI).sqrt() * s);
        let expected_efficiency = gnorm * 2f64.powf(dim as f64 / 2.0);

        Ok(Self {
            axes,
            mean,
            sigma,
            jacobian,
            gnorm,
            expected_efficiency,
        })
    }

    /// The reference 5-dimensional ellipsoid with correlations between all
    /// coordinates (jacobian 120).
    pub fn correlated_gaussian_5d() -> Result<Self, ProblemError> {
        let axes = vec![
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0, -4.0],
            vec![1.0, 1.0, 1.0, -3.0, 0.0],
            vec![1.0, 1.0, -2.0, 0.0, 0.0],
            vec![1.0, -1.0, 0.0, 0.0, 0.0],
        ];
        let mean = vec![2.0834496, -0.3645377, 1.17464764, -0.398642, 0.6886666];
        let sigma = vec![0.081, 0.056, 0.021, 0.032, 0.0789];
        Self::new(axes, mean, sigma)
    }

    /// Axis transform rows.
    pub fn axes(&self) -> &[Vec<f64>] {
        &self.axes
    }

    /// Target means in transformed coordinates.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Target widths in transformed coordinates.
    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    /// Absolute determinant of the axis transform.
    pub fn jacobian(&self) -> f64 {
        self.jacobian
    }

    /// Gaussian normalisation.
    pub fn gnorm(&self) -> f64 {
        self.gnorm
    }
}

impl Integrand for ProblemDefinition {
    fn dimension(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    fn evaluate(&self, point: &[f64]) -> f64 {
        debug_assert_eq!(point.len(), self.axes.len());
        let mut exponent = 0.0;
        for ((row, mu), sigma) in self.axes.iter().zip(&self.mean).zip(&self.sigma) {
            let v: f64 = row.iter().zip(point).map(|(a, u)| a * u).sum();
            let z = (v - mu) / sigma;
            exponent += z * z;
        }
        (-0.5 * exponent).exp() / self.gnorm
    }

    fn expected_efficiency(&self) -> f64 {
        self.expected_efficiency
    }
}

/// Determinant by Gaussian elimination with partial pivoting.
fn determinant(matrix: &[Vec<f64>]) -> f64 {
    let n = matrix.len();
    let mut m: Vec<Vec<f64>> = matrix.to_vec();
    let mut det = 1.0;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                let delta = factor * m[col][k];
                m[row][k] -= delta;
            }
        }
    }
    det
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_jacobian() {
        let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();
        assert_eq!(problem.dimension(), 5);
        assert_relative_eq!(problem.jacobian(), 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reference_expected_efficiency_matches_gnorm() {
        let problem = ProblemDefinition::correlated_gaussian_5d().unwrap();

        let sigmas = [0.081, 0.056, 0.021, 0.032, 0.0789];
        let mut gnorm = 1.0 / 120.0;
        for s in sigmas {
            gnorm *= (2.0 * PI).sqrt() * s;
        }
        let efficiency = gnorm * 2f64.powf(5.0 / 2.0);

        assert_relative_eq!(problem.gnorm(), gnorm, max_relative = 1e-12);
        assert_relative_eq!(problem.expected_efficiency(), efficiency, max_relative = 1e-12);
    }

    #[test]
    fn test_peak_value_is_inverse_gnorm() {
        let axes = vec![vec![2.0, 1.0], vec![-1.0, 1.0]];
        let u = [0.3, 0.6];
        let mean = vec![2.0 * u[0] + u[1], -u[0] + u[1]];
        let problem = ProblemDefinition::new(axes, mean, vec![0.1, 0.2]).unwrap();

        assert_relative_eq!(problem.jacobian(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(problem.evaluate(&u), 1.0 / problem.gnorm(), max_relative = 1e-12);
        assert!(problem.evaluate(&[0.0, 0.0]) < problem.evaluate(&u));
    }

    #[test]
    fn test_one_dimensional_integral_is_normalised() {
        // Midpoint rule on a narrow 1-D Gaussian centred in the unit interval.
        let problem = ProblemDefinition::new(vec![vec![1.0]], vec![0.5], vec![0.05]).unwrap();
        let n = 20_000;
        let h = 1.0 / n as f64;
        let integral: f64 = (0..n)
            .map(|i| problem.evaluate(&[(i as f64 + 0.5) * h]) * h)
            .sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-6);

        let integral_sq: f64 = (0..n)
            .map(|i| problem.evaluate(&[(i as f64 + 0.5) * h]).powi(2) * h)
            .sum();
        assert_relative_eq!(
            problem.expected_efficiency(),
            1.0 / integral_sq,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_shape_validation() {
        assert_eq!(
            ProblemDefinition::new(vec![], vec![], vec![]),
            Err(ProblemError::EmptyProblem)
        );
        assert!(matches!(
            ProblemDefinition::new(vec![vec![1.0, 0.0]], vec![0.5], vec![0.1]),
            Err(ProblemError::DimensionMismatch { field: "axes", .. })
        ));
        assert!(matches!(
            ProblemDefinition::new(vec![vec![1.0]], vec![0.5, 0.1], vec![0.1]),
            Err(ProblemError::DimensionMismatch { field: "mean", .. })
        ));
        assert!(matches!(
            ProblemDefinition::new(vec![vec![1.0]], vec![0.5], vec![-0.1]),
            Err(ProblemError::InvalidSigma { index: 0, .. })
        ));
    }

    #[test]
    fn test_singular_axes_rejected() {
        let axes = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(
            ProblemDefinition::new(axes, vec![0.0, 0.0], vec![1.0, 1.0]),
            Err(ProblemError::SingularAxes)
        );
    }

    #[test]
    fn test_determinant_with_pivoting() {
        let m = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_relative_eq!(determinant(&m), -1.0);
    }
}
