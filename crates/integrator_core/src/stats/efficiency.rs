//! Efficiency drift classification.
//!
//! The sampler reports its effective-sample-size efficiency at every check
//! boundary. The monitor compares it with the last accepted baseline using an
//! asymmetric multiplicative band: a measurement `e` is in range when
//! `lower·b ≤ e ≤ upper·b`. Both bounds are inclusive.

use crate::types::StatsError;
use serde::{Deserialize, Serialize};

/// Default lower band factor.
pub const DEFAULT_LOWER_FACTOR: f64 = 0.7;

/// Default upper band factor.
pub const DEFAULT_UPPER_FACTOR: f64 = 1.4;

/// Outcome of an efficiency check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EfficiencyStatus {
    /// Measurement lies inside the band.
    InRange,
    /// Measurement lies outside the band (or is not a number).
    Drifted,
}

impl EfficiencyStatus {
    /// Returns true for [`EfficiencyStatus::Drifted`].
    #[inline]
    pub fn is_drifted(&self) -> bool {
        matches!(self, EfficiencyStatus::Drifted)
    }
}

impl std::fmt::Display for EfficiencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EfficiencyStatus::InRange => write!(f, "in-range"),
            EfficiencyStatus::Drifted => write!(f, "drifted"),
        }
    }
}

/// Multiplicative tolerance band around a baseline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyBand {
    lower: f64,
    upper: f64,
}

impl EfficiencyBand {
    /// Creates a band with the given factors.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidBand`] unless `0 < lower <= 1 <= upper`
    /// and both factors are finite.
    pub fn new(lower: f64, upper: f64) -> Result<Self, StatsError> {
        let ordered = lower > 0.0 && lower <= 1.0 && upper >= 1.0;
        if !ordered || !lower.is_finite() || !upper.is_finite() {
            return Err(StatsError::InvalidBand { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Lower factor.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper factor.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl Default for EfficiencyBand {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER_FACTOR,
            upper: DEFAULT_UPPER_FACTOR,
        }
    }
}

/// Classifies measured efficiencies against a baseline.
///
/// # Example
///
/// ```rust
/// use integrator_core::stats::{EfficiencyMonitor, EfficiencyStatus};
///
/// let monitor = EfficiencyMonitor::default();
/// let statuses: Vec<_> = [0.06, 0.02, 0.051]
///     .iter()
///     .map(|e| monitor.classify(*e, 0.05))
///     .collect();
///
/// assert_eq!(
///     statuses,
///     vec![EfficiencyStatus::InRange, EfficiencyStatus::Drifted, EfficiencyStatus::InRange]
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMonitor {
    band: EfficiencyBand,
}

impl EfficiencyMonitor {
    /// Creates a monitor with a custom band.
    pub fn new(band: EfficiencyBand) -> Self {
        Self { band }
    }

    /// Returns the configured band.
    pub fn band(&self) -> &EfficiencyBand {
        &self.band
    }

    /// Classifies `measured` against `baseline`.
    #[inline]
    pub fn classify(&self, measured: f64, baseline: f64) -> EfficiencyStatus {
        if measured >= self.band.lower * baseline && measured <= self.band.upper * baseline {
            EfficiencyStatus::InRange
        } else {
            EfficiencyStatus::Drifted
        }
    }
}

/// The most recently accepted expected efficiency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyBaseline {
    value: f64,
}

impl EfficiencyBaseline {
    /// Creates a baseline from the problem's expected efficiency.
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Current baseline value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Replaces the baseline after a successful adaptation.
    #[inline]
    pub fn accept(&mut self, value: f64) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_boundaries_are_inclusive() {
        let monitor = EfficiencyMonitor::default();
        let b = 0.5;
        assert_eq!(monitor.classify(0.7 * b, b), EfficiencyStatus::InRange);
        assert_eq!(monitor.classify(1.4 * b, b), EfficiencyStatus::InRange);
        assert_eq!(monitor.classify(b, b), EfficiencyStatus::InRange);
    }

    #[test]
    fn test_outside_band_is_drifted() {
        let monitor = EfficiencyMonitor::default();
        assert_eq!(monitor.classify(0.034, 0.05), EfficiencyStatus::Drifted);
        assert_eq!(monitor.classify(0.0701, 0.05), EfficiencyStatus::Drifted);
        assert!(monitor.classify(0.02, 0.05).is_drifted());
    }

    #[test]
    fn test_nan_measurement_is_drifted() {
        let monitor = EfficiencyMonitor::default();
        assert_eq!(monitor.classify(f64::NAN, 0.05), EfficiencyStatus::Drifted);
    }

    #[test]
    fn test_scenario_sequence() {
        let monitor = EfficiencyMonitor::default();
        let got: Vec<_> = [0.06, 0.02, 0.051]
            .into_iter()
            .map(|e| monitor.classify(e, 0.05))
            .collect();
        assert_eq!(
            got,
            vec![
                EfficiencyStatus::InRange,
                EfficiencyStatus::Drifted,
                EfficiencyStatus::InRange
            ]
        );
    }

    #[test]
    fn test_custom_band() {
        let band = EfficiencyBand::new(0.5, 2.0).unwrap();
        let monitor = EfficiencyMonitor::new(band);
        assert_eq!(monitor.classify(0.03, 0.05), EfficiencyStatus::InRange);
        assert_eq!(monitor.classify(0.099, 0.05), EfficiencyStatus::InRange);
        assert_eq!(monitor.band().upper(), 2.0);
    }

    #[test]
    fn test_invalid_band_rejected() {
        assert!(EfficiencyBand::new(0.0, 1.4).is_err());
        assert!(EfficiencyBand::new(1.1, 1.4).is_err());
        assert!(EfficiencyBand::new(0.7, 0.9).is_err());
        assert!(EfficiencyBand::new(0.7, f64::INFINITY).is_err());
    }

    #[test]
    fn test_baseline_accept() {
        let mut baseline = EfficiencyBaseline::new(0.05);
        baseline.accept(0.12);
        assert_eq!(baseline.value(), 0.12);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EfficiencyStatus::InRange.to_string(), "in-range");
        assert_eq!(EfficiencyStatus::Drifted.to_string(), "drifted");
    }

    proptest! {
        #[test]
        fn prop_in_range_iff_within_band(e in 0.0..2.0f64, b in 1e-4..1.0f64) {
            let monitor = EfficiencyMonitor::default();
            let expected = 0.7 * b <= e && e <= 1.4 * b;
            prop_assert_eq!(
                monitor.classify(e, b) == EfficiencyStatus::InRange,
                expected
            );
        }
    }
}
