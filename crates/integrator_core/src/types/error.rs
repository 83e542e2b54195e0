//! Error types for structured error handling.
//!
//! This module provides:
//! - `StatsError`: Errors from statistics accumulation and efficiency bands
//! - `ProblemError`: Errors from integrand problem construction

use thiserror::Error;

/// Statistics errors.
///
/// # Examples
/// ```
/// use integrator_core::types::StatsError;
///
/// let err = StatsError::InsufficientData;
/// assert_eq!(format!("{}", err), "Insufficient data: no samples accumulated");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// An estimate was requested from an empty window.
    #[error("Insufficient data: no samples accumulated")]
    InsufficientData,

    /// The sample count could not be represented in the value type.
    #[error("Sample count {count} is not representable as a floating-point value")]
    CountConversion {
        /// Offending count
        count: u64,
    },

    /// Efficiency band factors are not ordered `0 < lower <= 1 <= upper`.
    #[error("Invalid efficiency band [{lower}, {upper}]")]
    InvalidBand {
        /// Lower multiplicative factor
        lower: f64,
        /// Upper multiplicative factor
        upper: f64,
    },
}

/// Problem definition errors.
///
/// # Examples
/// ```
/// use integrator_core::types::ProblemError;
///
/// let err = ProblemError::DimensionMismatch { field: "sigma", expected: 5, actual: 4 };
/// assert_eq!(format!("{}", err), "Dimension mismatch for sigma: expected 5, got 4");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    /// A problem must have at least one dimension.
    #[error("Problem dimension must be at least 1")]
    EmptyProblem,

    /// A component's length disagrees with the problem dimension.
    #[error("Dimension mismatch for {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the offending component
        field: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A width parameter was zero, negative or non-finite.
    #[error("Sigma at index {index} must be positive and finite, got {value}")]
    InvalidSigma {
        /// Coordinate index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// The axis transform has no inverse.
    #[error("Axis transform is singular")]
    SingularAxes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_error_display() {
        let err = StatsError::InvalidBand {
            lower: 1.2,
            upper: 0.8,
        };
        assert!(err.to_string().contains("1.2"));
        assert!(err.to_string().contains("0.8"));

        let err = StatsError::CountConversion { count: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_problem_error_display() {
        let err = ProblemError::InvalidSigma {
            index: 2,
            value: -0.5,
        };
        assert_eq!(
            err.to_string(),
            "Sigma at index 2 must be positive and finite, got -0.5"
        );
        assert_eq!(
            ProblemError::SingularAxes.to_string(),
            "Axis transform is singular"
        );
    }
}
