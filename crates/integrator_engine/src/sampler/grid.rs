//! Per-axis adaptive grid sampler.
//!
//! Each axis of the unit cube is divided into `n_bins` bins of adaptive
//! width. A draw picks one bin per axis uniformly and a uniform position
//! inside it, so the proposal density is piecewise constant and the
//! importance weight is `Πᵢ n_bins·widthᵢ`.
//!
//! Feedback accumulates the squared weighted value per axis-bin. On
//! [`adapt`](AdaptiveSampler::adapt) the bins are redistributed so that each
//! carries an equal share of the smoothed, damped importance
//!
//! ```text
//! r_k  = d_k / Σ d          (smoothed share of bin k)
//! m_k  = ((r_k − 1) / ln r_k)^α
//! ```
//!
//! which concentrates bins where the integrand is large.

use super::{AdaptiveSampler, SampleDraw};
use crate::checkpoint::{read_snapshot, write_snapshot, CheckpointError, CheckpointResult};
use crate::error::ConfigError;
use crate::rng::{SamplerRng, UniformSource};
use integrator_core::stats::{Accumulator, RunResult};
use integrator_core::types::StatsError;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// Sampler kind recorded in snapshot envelopes.
pub const GRID_SAMPLER_KIND: &str = "grid";

/// Interior edges moving less than this fraction of a uniform bin width are
/// not counted as modified.
const EDGE_TOLERANCE: f64 = 1e-3;

/// Tuning parameters of a [`GridSampler`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSamplerConfig {
    /// Number of bins per axis (at least 2).
    pub n_bins: usize,
    /// Damping exponent of the rebinning (0 disables adaptation).
    pub alpha: f64,
    /// Training samples required per bin before an adaptation may happen.
    pub sensitivity: u64,
}

impl Default for GridSamplerConfig {
    fn default() -> Self {
        Self {
            n_bins: 50,
            alpha: 1.5,
            sensitivity: 100,
        }
    }
}

impl GridSamplerConfig {
    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] for fewer than two bins or a
    /// negative / non-finite damping exponent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_bins < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "n_bins",
                value: format!("{} (must be at least 2)", self.n_bins),
            });
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "alpha",
                value: format!("{} (must be finite and non-negative)", self.alpha),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GridState {
    dimension: usize,
    n_bins: usize,
    alpha: f64,
    sensitivity: u64,
    edges: Vec<Vec<f64>>,
    training: Vec<Vec<f64>>,
    training_count: u64,
    totals: Accumulator,
    last_efficiency: f64,
}

impl GridState {
    fn check_shape(&self) -> CheckpointResult<()> {
        let well_formed = self.dimension > 0
            && self.n_bins >= 2
            && self.edges.len() == self.dimension
            && self.training.len() == self.dimension
            && self.edges.iter().all(|e| e.len() == self.n_bins + 1)
            && self.training.iter().all(|t| t.len() == self.n_bins);
        if !well_formed {
            return Err(CheckpointError::Incompatible {
                message: "grid shape is inconsistent".to_string(),
            });
        }
        Ok(())
    }
}

/// Adaptive grid importance sampler.
///
/// # Example
///
/// ```rust
/// use integrator_engine::rng::SamplerRng;
/// use integrator_engine::sampler::{AdaptiveSampler, GridSampler, GridSamplerConfig, SampleDraw};
///
/// let mut sampler = GridSampler::new(2, GridSamplerConfig::default(), SamplerRng::from_seed(1)).unwrap();
/// let mut draw = SampleDraw::new(2);
///
/// for _ in 0..1000 {
///     sampler.sample(&mut draw);
///     let value = draw.point[0] * draw.point[1];
///     sampler.feedback(&draw.point, draw.weight * value);
/// }
///
/// let estimate = sampler.estimate().unwrap();
/// assert!((estimate.mean - 0.25).abs() < 5.0 * estimate.std_error + 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct GridSampler<R: UniformSource = SamplerRng> {
    state: GridState,
    verbosity: u8,
    rng: R,
}

impl<R: UniformSource> GridSampler<R> {
    /// Creates a sampler with uniform bins on every axis.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for a zero dimension or invalid tuning parameters.
    pub fn new(dimension: usize, config: GridSamplerConfig, rng: R) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "dimension",
                value: "0 (must be at least 1)".to_string(),
            });
        }
        config.validate()?;

        let n = config.n_bins;
        let uniform: Vec<f64> = (0..=n).map(|k| k as f64 / n as f64).collect();

        Ok(Self {
            state: GridState {
                dimension,
                n_bins: n,
                alpha: config.alpha,
                sensitivity: config.sensitivity,
                edges: vec![uniform; dimension],
                training: vec![vec![0.0; n]; dimension],
                training_count: 0,
                totals: Accumulator::new(),
                last_efficiency: 0.0,
            },
            verbosity: 0,
            rng,
        })
    }

    /// Rebuilds a sampler entirely from a snapshot, taking dimension and
    /// tuning parameters from the file.
    ///
    /// # Errors
    ///
    /// Any [`CheckpointError`] raised while reading or validating the snapshot.
    pub fn from_checkpoint(path: &Path, rng: R) -> CheckpointResult<Self> {
        let state = read_snapshot::<GridState>(path, GRID_SAMPLER_KIND)?.state;
        state.check_shape()?;
        Ok(Self {
            state,
            verbosity: 0,
            rng,
        })
    }

    /// Number of bins per axis.
    pub fn n_bins(&self) -> usize {
        self.state.n_bins
    }

    /// Bin edges of `axis` (length `n_bins + 1`, from 0 to 1).
    pub fn edges(&self, axis: usize) -> &[f64] {
        &self.state.edges[axis]
    }

    /// Current adaptation sensitivity.
    pub fn sensitivity(&self) -> u64 {
        self.state.sensitivity
    }

    /// Training samples collected since the last adaptation.
    pub fn training_count(&self) -> u64 {
        self.state.training_count
    }

    fn locate(&self, axis: usize, x: f64) -> usize {
        let edges = &self.state.edges[axis];
        edges
            .partition_point(|e| *e <= x)
            .saturating_sub(1)
            .min(self.state.n_bins - 1)
    }
}

impl<R: UniformSource> AdaptiveSampler for GridSampler<R> {
    fn dimension(&self) -> usize {
        self.state.dimension
    }

    fn sample(&mut self, draw: &mut SampleDraw) {
        debug_assert_eq!(draw.point.len(), self.state.dimension);
        self.rng.fill_uniform(&mut draw.point);

        let n = self.state.n_bins;
        let scale = n as f64;
        let mut weight = 1.0;
        for (x, edges) in draw.point.iter_mut().zip(&self.state.edges) {
            let r = *x * scale;
            let bin = (r as usize).min(n - 1);
            let lo = edges[bin];
            let width = edges[bin + 1] - lo;
            *x = lo + (r - bin as f64) * width;
            weight *= scale * width;
        }
        draw.weight = weight;
    }

    fn feedback(&mut self, point: &[f64], weighted_value: f64) {
        self.state.totals.update(weighted_value);
        self.state.training_count += 1;

        let sq = weighted_value * weighted_value;
        for (axis, x) in point.iter().enumerate() {
            let bin = self.locate(axis, *x);
            self.state.training[axis][bin] += sq;
        }
    }

    fn adapt(&mut self) -> usize {
        let required = self.state.sensitivity.saturating_mul(self.state.n_bins as u64);
        if self.state.training_count < required {
            if self.verbosity > 0 {
                debug!(
                    training = self.state.training_count,
                    required, "Too little training data, grid unchanged"
                );
            }
            return 0;
        }

        let tolerance = EDGE_TOLERANCE / self.state.n_bins as f64;
        let mut modified = 0;
        for axis in 0..self.state.dimension {
            let Some(new_edges) = rebin(
                &self.state.edges[axis],
                &self.state.training[axis],
                self.state.alpha,
            ) else {
                continue;
            };
            let moved = new_edges
                .iter()
                .zip(&self.state.edges[axis])
                .filter(|(new, old)| (*new - *old).abs() > tolerance)
                .count();
            if self.verbosity > 1 {
                debug!(axis, moved, "Rebinned axis");
            }
            modified += moved;
            self.state.edges[axis] = new_edges;
        }

        for bins in &mut self.state.training {
            bins.iter_mut().for_each(|b| *b = 0.0);
        }
        self.state.training_count = 0;

        if self.verbosity > 0 {
            info!(modified, "Grid adaptation complete");
        }
        modified
    }

    fn effective_sample_count(&self) -> f64 {
        self.state.totals.count() as f64 * self.efficiency()
    }

    fn sample_count(&self) -> u64 {
        self.state.totals.count()
    }

    fn efficiency(&self) -> f64 {
        match self.state.totals.estimate() {
            Ok(result) => result.efficiency,
            Err(_) => self.state.last_efficiency,
        }
    }

    fn estimate(&self) -> Result<RunResult, StatsError> {
        self.state.totals.estimate()
    }

    fn save_checkpoint(&self, path: &Path) -> CheckpointResult<()> {
        write_snapshot(path, GRID_SAMPLER_KIND, &self.state)?;
        if self.verbosity > 1 {
            debug!(path = %path.display(), "Saved grid state");
        }
        Ok(())
    }

    fn restore_checkpoint(&mut self, path: &Path) -> CheckpointResult<()> {
        let envelope = read_snapshot::<GridState>(path, GRID_SAMPLER_KIND)?;
        let state = envelope.state;

        if state.dimension != self.state.dimension {
            return Err(CheckpointError::Incompatible {
                message: format!(
                    "snapshot has dimension {}, sampler has {}",
                    state.dimension, self.state.dimension
                ),
            });
        }
        state.check_shape()?;

        self.state = state;
        if self.verbosity > 0 {
            info!(path = %path.display(), saved_at = %envelope.saved_at, "Restored grid state");
        }
        Ok(())
    }

    fn reset_statistics(&mut self) {
        if let Ok(result) = self.state.totals.estimate() {
            self.state.last_efficiency = result.efficiency;
        }
        self.state.totals.reset();
    }

    fn set_verbosity(&mut self, level: u8) {
        self.verbosity = level;
    }

    fn set_adaptation_sensitivity(&mut self, threshold: u64) {
        self.state.sensitivity = threshold;
    }

    fn describe(&self) -> String {
        let s = &self.state;
        let mut out = format!(
            "grid sampler: {} axes x {} bins, alpha {}, sensitivity {}\n",
            s.dimension, s.n_bins, s.alpha, s.sensitivity
        );
        for (axis, edges) in s.edges.iter().enumerate() {
            let widths = edges.windows(2).map(|w| w[1] - w[0]);
            let (densest, narrowest) = widths
                .clone()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            let widest = widths.fold(0.0, f64::max);
            let _ = writeln!(
                out,
                "  axis {}: densest bin [{:.6}, {:.6}) width {:.3e}, widest width {:.3e}",
                axis,
                edges[densest],
                edges[densest + 1],
                narrowest,
                widest
            );
        }
        let _ = write!(
            out,
            "  statistics: {} samples, efficiency {:.4e}",
            s.totals.count(),
            self.efficiency()
        );
        out
    }
}

/// Redistributes bin edges so each new bin carries equal damped importance.
///
/// Returns `None` when the training data carries no information.
fn rebin(edges: &[f64], training: &[f64], alpha: f64) -> Option<Vec<f64>> {
    let n = training.len();
    let total: f64 = training.iter().sum();
    if n < 2 || !(total.is_finite() && total > 0.0) {
        return None;
    }

    let mut smoothed = vec![0.0; n];
    smoothed[0] = (7.0 * training[0] + training[1]) / 8.0;
    smoothed[n - 1] = (training[n - 2] + 7.0 * training[n - 1]) / 8.0;
    for k in 1..n - 1 {
        smoothed[k] = (training[k - 1] + 6.0 * training[k] + training[k + 1]) / 8.0;
    }
    let smoothed_total: f64 = smoothed.iter().sum();

    let importance: Vec<f64> = smoothed
        .iter()
        .map(|d| {
            let r = d / smoothed_total;
            if r <= 0.0 {
                0.0
            } else if r >= 1.0 {
                1.0
            } else {
                ((r - 1.0) / r.ln()).powf(alpha)
            }
        })
        .collect();
    let per_bin = importance.iter().sum::<f64>() / n as f64;
    if !(per_bin > 0.0) {
        return None;
    }

    let mut new_edges = Vec::with_capacity(n + 1);
    new_edges.push(0.0);
    let mut acc = 0.0;
    let mut k = 0;
    for _ in 1..n {
        while acc < per_bin && k < n {
            acc += importance[k];
            k += 1;
        }
        acc -= per_bin;
        let (lo, hi) = (edges[k - 1], edges[k]);
        let edge = if importance[k - 1] > 0.0 {
            hi - acc / importance[k - 1] * (hi - lo)
        } else {
            hi
        };
        let floor = new_edges.last().copied().unwrap_or(0.0);
        new_edges.push(edge.clamp(lo, hi).max(floor));
    }
    new_edges.push(1.0);
    Some(new_edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sampler(dimension: usize, n_bins: usize, seed: u64) -> GridSampler {
        let config = GridSamplerConfig {
            n_bins,
            alpha: 1.5,
            sensitivity: 10,
        };
        GridSampler::new(dimension, config, SamplerRng::from_seed(seed)).unwrap()
    }

    fn train<F: Fn(&[f64]) -> f64>(s: &mut GridSampler, n: usize, f: F) {
        let mut draw = SampleDraw::new(s.dimension());
        for _ in 0..n {
            s.sample(&mut draw);
            let wv = draw.weight * f(&draw.point);
            s.feedback(&draw.point, wv);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        let rng = SamplerRng::from_seed(1);
        assert!(GridSampler::new(0, GridSamplerConfig::default(), rng.clone()).is_err());

        let config = GridSamplerConfig {
            n_bins: 1,
            ..Default::default()
        };
        assert!(GridSampler::new(2, config, rng.clone()).is_err());

        let config = GridSamplerConfig {
            alpha: f64::NAN,
            ..Default::default()
        };
        assert!(GridSampler::new(2, config, rng).is_err());
    }

    #[test]
    fn test_uniform_grid_has_unit_weight() {
        let mut s = sampler(3, 10, 5);
        let mut draw = SampleDraw::new(3);
        for _ in 0..100 {
            s.sample(&mut draw);
            assert_relative_eq!(draw.weight, 1.0, epsilon = 1e-12);
            assert!(draw.point.iter().all(|x| (0.0..1.0).contains(x)));
        }
    }

    #[test]
    fn test_constant_integrand_has_unit_efficiency() {
        let mut s = sampler(2, 10, 11);
        train(&mut s, 500, |_| 1.0);
        assert_eq!(s.sample_count(), 500);
        assert_relative_eq!(s.efficiency(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(s.effective_sample_count(), 500.0, epsilon = 1e-6);
        assert_relative_eq!(s.estimate().unwrap().mean, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_adapt_requires_training() {
        let mut s = sampler(1, 10, 2);
        train(&mut s, 50, |x| x[0]);
        // 10 bins x sensitivity 10 = 100 samples needed
        assert_eq!(s.adapt(), 0);
        assert_eq!(s.training_count(), 50);
    }

    #[test]
    fn test_adapt_concentrates_bins_on_peak() {
        let mut s = sampler(1, 20, 3);
        let peak = |x: &[f64]| (-0.5 * ((x[0] - 0.3) / 0.02).powi(2)).exp();
        for _ in 0..5 {
            train(&mut s, 5_000, peak);
            s.adapt();
        }
        let edges = s.edges(0);
        assert_eq!(edges.len(), 21);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[20], 1.0);
        assert!(edges.windows(2).all(|w| w[1] >= w[0]));

        let bin = s.locate(0, 0.3);
        let width_at_peak = edges[bin + 1] - edges[bin];
        assert!(width_at_peak < 0.05, "peak bin width {}", width_at_peak);
    }

    #[test]
    fn test_adapt_reports_modifications_and_clears_training() {
        let mut s = sampler(2, 10, 4);
        train(&mut s, 2_000, |x| (-50.0 * (x[0] - 0.5).powi(2)).exp());
        let modified = s.adapt();
        assert!(modified > 0);
        assert_eq!(s.training_count(), 0);
        // Running totals survive adaptation.
        assert_eq!(s.sample_count(), 2_000);
    }

    #[test]
    fn test_zero_integrand_leaves_grid_unchanged() {
        let mut s = sampler(1, 10, 6);
        train(&mut s, 500, |_| 0.0);
        let before = s.edges(0).to_vec();
        assert_eq!(s.adapt(), 0);
        assert_eq!(s.edges(0), before.as_slice());
    }

    #[test]
    fn test_reset_statistics_keeps_last_efficiency() {
        let mut s = sampler(1, 10, 7);
        train(&mut s, 300, |x| x[0]);
        let eff = s.efficiency();
        s.reset_statistics();

        assert_eq!(s.sample_count(), 0);
        assert!(s.estimate().is_err());
        assert_relative_eq!(s.efficiency(), eff);
        assert_eq!(s.effective_sample_count(), 0.0);
    }

    #[test]
    fn test_checkpoint_roundtrip_restores_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.astate");

        let mut s = sampler(2, 10, 8);
        train(&mut s, 1_000, |x| (-20.0 * (x[1] - 0.2).powi(2)).exp());
        s.adapt();
        s.save_checkpoint(&path).unwrap();
        let saved_edges = s.edges(1).to_vec();
        let saved_count = s.sample_count();

        train(&mut s, 1_000, |x| x[0]);
        s.adapt();

        s.restore_checkpoint(&path).unwrap();
        assert_eq!(s.edges(1), saved_edges.as_slice());
        assert_eq!(s.sample_count(), saved_count);
    }

    #[test]
    fn test_restore_rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.astate");
        sampler(3, 10, 9).save_checkpoint(&path).unwrap();

        let mut other = sampler(2, 10, 9);
        assert!(matches!(
            other.restore_checkpoint(&path),
            Err(CheckpointError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_from_checkpoint_takes_shape_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.astate");
        let mut s = sampler(3, 12, 11);
        train(&mut s, 500, |x| x[2]);
        s.save_checkpoint(&path).unwrap();

        let loaded = GridSampler::from_checkpoint(&path, SamplerRng::from_seed(0)).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.n_bins(), 12);
        assert_eq!(loaded.sample_count(), 500);
        assert_eq!(loaded.edges(2), s.edges(2));
    }

    #[test]
    fn test_sensitivity_setter() {
        let mut s = sampler(1, 10, 10);
        s.set_adaptation_sensitivity(1000);
        assert_eq!(s.sensitivity(), 1000);
    }

    #[test]
    fn test_describe_lists_axes() {
        let mut s = sampler(2, 10, 12);
        train(&mut s, 100, |_| 1.0);
        let text = s.describe();
        assert!(text.contains("2 axes x 10 bins"));
        assert!(text.contains("axis 0"));
        assert!(text.contains("axis 1"));
        assert!(text.contains("100 samples"));
    }

    #[test]
    fn test_rebin_uniform_training_keeps_uniform_grid() {
        let edges: Vec<f64> = (0..=4).map(|k| k as f64 / 4.0).collect();
        let new_edges = rebin(&edges, &[1.0; 4], 1.5).unwrap();
        for (a, b) in new_edges.iter().zip(&edges) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}
