//! Windowed accumulation of weighted integrand values.
//!
//! The accumulator keeps three running sums (count, Σx, Σx²) for the
//! importance-weighted values `x = w·f(u)` produced by the sampling loop.
//! From these the importance-sampling estimate, its standard error and the
//! sampling efficiency are recovered in O(1).

use crate::types::StatsError;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Running sums over a sampling window.
///
/// # Type Parameters
///
/// * `T` - Floating-point type (defaults to `f64`)
///
/// # Invariants
///
/// `count` equals the number of [`update`](Self::update) calls since the
/// last [`reset`](Self::reset) and never decreases in between.
///
/// # Example
///
/// ```rust
/// use integrator_core::stats::Accumulator;
///
/// let mut acc: Accumulator = Accumulator::new();
/// for x in [0.5, 1.5, 1.0] {
///     acc.update(x);
/// }
/// assert_eq!(acc.count(), 3);
///
/// let result = acc.estimate().unwrap();
/// assert!((result.mean - 1.0).abs() < 1e-12);
///
/// acc.reset();
/// assert!(acc.estimate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Accumulator<T: Float = f64> {
    count: u64,
    sum: T,
    sum_sq: T,
}

/// Point estimate derived from an [`Accumulator`].
///
/// Valid both as a running estimate and as the final report of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult<T = f64> {
    /// Mean weighted value (the integral estimate).
    pub mean: T,
    /// Standard error of the mean.
    pub std_error: T,
    /// Sampling efficiency `(Σx)² / (n·Σx²)`.
    pub efficiency: T,
    /// Number of accumulated values.
    pub count: u64,
}

impl<T: Float> RunResult<T> {
    /// Returns the 95% confidence interval half-width.
    #[inline]
    pub fn confidence_95(&self) -> T {
        T::from(1.96).unwrap_or_else(T::one) * self.std_error
    }

    /// Effective number of independent samples, `efficiency · count`.
    pub fn effective_sample_size(&self) -> T {
        T::from(self.count).map_or_else(T::zero, |n| self.efficiency * n)
    }
}

impl<T: Float> Accumulator<T> {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: T::zero(),
            sum_sq: T::zero(),
        }
    }

    /// Adds one weighted value to the window.
    #[inline]
    pub fn update(&mut self, weighted_value: T) {
        self.count += 1;
        self.sum = self.sum + weighted_value;
        self.sum_sq = self.sum_sq + weighted_value * weighted_value;
    }

    /// Clears the window. Idempotent.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of values accumulated since the last reset.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of accumulated values.
    #[inline]
    pub fn sum(&self) -> T {
        self.sum
    }

    /// Sum of squared accumulated values.
    #[inline]
    pub fn sum_sq(&self) -> T {
        self.sum_sq
    }

    /// Returns true if nothing has been accumulated since the last reset.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Computes the estimate, its standard error and the efficiency.
    ///
    /// `mean = Σx/n`, `eff = (Σx)²/(n·Σx²)`, `stderr = sqrt(Σx²·(1-eff))/n`.
    /// A window of all-zero values reports zero efficiency and zero error.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InsufficientData`] when the window is empty.
    pub fn estimate(&self) -> Result<RunResult<T>, StatsError> {
        if self.count == 0 {
            return Err(StatsError::InsufficientData);
        }
        let n = T::from(self.count).ok_or(StatsError::CountConversion { count: self.count })?;

        let mean = self.sum / n;
        if self.sum_sq <= T::zero() {
            return Ok(RunResult {
                mean,
                std_error: T::zero(),
                efficiency: T::zero(),
                count: self.count,
            });
        }

        let efficiency = self.sum * self.sum / (n * self.sum_sq);
        // Rounding can push eff marginally above one for near-constant windows.
        let spread = (T::one() - efficiency).max(T::zero());
        let std_error = (self.sum_sq * spread).sqrt() / n;

        Ok(RunResult {
            mean,
            std_error,
            efficiency,
            count: self.count,
        })
    }
}

impl<T: Float> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_new_is_empty() {
        let acc: Accumulator = Accumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.sum(), 0.0);
        assert_eq!(acc.sum_sq(), 0.0);
    }

    #[test]
    fn test_update_sums() {
        let mut acc: Accumulator = Accumulator::new();
        acc.update(2.0);
        acc.update(-3.0);

        assert_eq!(acc.count(), 2);
        assert_relative_eq!(acc.sum(), -1.0);
        assert_relative_eq!(acc.sum_sq(), 13.0);
    }

    #[test]
    fn test_estimate_matches_closed_form() {
        let mut acc: Accumulator = Accumulator::new();
        let values = [0.2, 1.8, 0.9, 1.1];
        for v in values {
            acc.update(v);
        }
        let result = acc.estimate().unwrap();

        let n = values.len() as f64;
        let sum: f64 = values.iter().sum();
        let sum_sq: f64 = values.iter().map(|v| v * v).sum();
        let eff = sum * sum / (n * sum_sq);

        assert_relative_eq!(result.mean, sum / n, epsilon = 1e-14);
        assert_relative_eq!(result.efficiency, eff, epsilon = 1e-14);
        assert_relative_eq!(
            result.std_error,
            (sum_sq * (1.0 - eff)).sqrt() / n,
            epsilon = 1e-14
        );
        assert_eq!(result.count, 4);
    }

    #[test]
    fn test_constant_values_have_unit_efficiency() {
        let mut acc: Accumulator = Accumulator::new();
        for _ in 0..10 {
            acc.update(0.7);
        }
        let result = acc.estimate().unwrap();
        assert_relative_eq!(result.efficiency, 1.0, epsilon = 1e-12);
        assert!(result.std_error >= 0.0);
        assert!(result.std_error < 1e-6);
        assert_relative_eq!(result.effective_sample_size(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_zero_window() {
        let mut acc: Accumulator = Accumulator::new();
        acc.update(0.0);
        acc.update(0.0);
        let result = acc.estimate().unwrap();
        assert_eq!(result.mean, 0.0);
        assert_eq!(result.std_error, 0.0);
        assert_eq!(result.efficiency, 0.0);
    }

    #[test]
    fn test_empty_estimate_is_insufficient_data() {
        let acc: Accumulator = Accumulator::new();
        assert_eq!(acc.estimate(), Err(StatsError::InsufficientData));
    }

    #[test]
    fn test_reset_then_estimate_fails() {
        let mut acc: Accumulator = Accumulator::new();
        acc.update(1.0);
        acc.reset();
        assert_eq!(acc.estimate(), Err(StatsError::InsufficientData));

        // Idempotent
        acc.reset();
        assert_eq!(acc, Accumulator::new());
    }

    #[test]
    fn test_f32_accumulator() {
        let mut acc: Accumulator<f32> = Accumulator::new();
        acc.update(1.0);
        acc.update(3.0);
        assert_relative_eq!(acc.estimate().unwrap().mean, 2.0_f32);
    }

    #[test]
    fn test_confidence_95() {
        let result = RunResult {
            mean: 1.0,
            std_error: 0.5,
            efficiency: 0.2,
            count: 100,
        };
        assert_relative_eq!(result.confidence_95(), 0.98);
        assert_relative_eq!(result.effective_sample_size(), 20.0);
    }

    proptest! {
        #[test]
        fn prop_count_equals_number_of_updates(values in prop::collection::vec(-1.0e3..1.0e3f64, 0..200)) {
            let mut acc: Accumulator = Accumulator::new();
            for (i, v) in values.iter().enumerate() {
                acc.update(*v);
                prop_assert_eq!(acc.count(), i as u64 + 1);
            }
            prop_assert_eq!(acc.count(), values.len() as u64);
        }

        #[test]
        fn prop_efficiency_is_bounded(values in prop::collection::vec(0.0..1.0e3f64, 1..200)) {
            let mut acc: Accumulator = Accumulator::new();
            for v in &values {
                acc.update(*v);
            }
            let result = acc.estimate().unwrap();
            prop_assert!(result.efficiency >= 0.0);
            prop_assert!(result.efficiency <= 1.0 + 1e-9);
            prop_assert!(result.std_error >= 0.0);
        }
    }
}
