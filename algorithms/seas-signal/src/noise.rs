//! Noise classification by temporal autocorrelation
//!
//! Signal components evolve slowly compared to the frame rate and have a lag-1
//! autocorrelation close to one, noise components sit near zero. The autocorrelations of a set
//! of components are smoothed by a Gaussian kernel density estimate on `[-1, 1]` and split at
//! the deepest valley between the two dominant modes.
use log::{debug, trace};
use ndarray::{Array1, ArrayView1, ArrayView2};
use ndarray_stats::QuantileExt;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use seas::correlation::lag_n_autocorr;
use seas::error::Result;
use seas::traits::{NoiseClassifier, NoiseLabels};
use seas::Float;

use crate::error::SignalError;

/// Kernel density noise classifier
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSorter {
    grid_points: usize,
    bandwidth: Option<f64>,
    fallback_cutoff: f64,
}

impl Default for NoiseSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSorter {
    pub fn new() -> Self {
        NoiseSorter {
            grid_points: 201,
            bandwidth: None,
            fallback_cutoff: 0.5,
        }
    }

    /// Number of evaluation points of the density on `[-1, 1]`
    pub fn grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Fixed kernel bandwidth, Scott's rule otherwise
    pub fn bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Cutoff used when the autocorrelations do not form two modes
    pub fn fallback_cutoff(mut self, fallback_cutoff: f64) -> Self {
        self.fallback_cutoff = fallback_cutoff;
        self
    }

    fn scott_bandwidth(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let values = ArrayView1::from(values);
        let bandwidth = values.std(1.) * (values.len() as f64).powf(-0.2);

        if bandwidth > 0. && bandwidth.is_finite() {
            Some(bandwidth)
        } else {
            None
        }
    }

    /// Gaussian kernel density of `values` on the evaluation grid
    pub fn density(&self, values: &[f64], bandwidth: f64) -> (Array1<f64>, Array1<f64>) {
        let grid = Array1::linspace(-1., 1., self.grid_points);
        let norm = values.len() as f64 * bandwidth * (2. * std::f64::consts::PI).sqrt();
        let density = grid.mapv(|x| {
            values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                / norm
        });

        (grid, density)
    }

    /// Position of the deepest valley between the two highest modes of `values`
    pub fn cutoff(&self, values: &[f64]) -> Option<f64> {
        let bandwidth = match self.bandwidth {
            Some(bandwidth) => bandwidth,
            None => Self::scott_bandwidth(values)?,
        };
        let (grid, density) = self.density(values, bandwidth);
        let n = density.len();
        if n < 3 {
            return None;
        }

        let mut peaks: Vec<usize> = (0..n)
            .filter(|&i| {
                let left = i == 0 || density[i] > density[i - 1];
                let right = i == n - 1 || density[i] >= density[i + 1];
                left && right
            })
            .collect();
        trace!("density modes at {:?}", peaks);
        if peaks.len() < 2 {
            return None;
        }

        peaks.sort_by(|&a, &b| {
            density[b]
                .partial_cmp(&density[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (lo, hi) = (peaks[0].min(peaks[1]), peaks[0].max(peaks[1]));
        let valley = density.slice(s![lo..=hi]).argmin().ok()? + lo;

        Some(grid[valley])
    }
}

impl<F: Float> NoiseClassifier<F> for NoiseSorter {
    fn classify(&self, timecourses: ArrayView2<F>) -> Result<NoiseLabels<F>> {
        if self.grid_points < 3 {
            return Err(SignalError::InvalidValue(format!(
                "density grid needs at least 3 points, got {}",
                self.grid_points
            ))
            .into());
        }

        let lag1: Vec<f64> = lag_n_autocorr(&timecourses, 1)
            .iter()
            .map(|v| v.to_f64().unwrap_or(0.))
            .collect();
        let cutoff = self.cutoff(&lag1).unwrap_or_else(|| {
            debug!(
                "no bimodal autocorrelation in {} components, falling back to {}",
                lag1.len(),
                self.fallback_cutoff
            );
            self.fallback_cutoff
        });

        let noise: Array1<bool> = lag1.iter().map(|&v| v < cutoff).collect();
        debug!(
            "{} of {} components below lag-1 cutoff {:.3}",
            noise.iter().filter(|&&n| n).count(),
            noise.len(),
            cutoff
        );

        Ok(NoiseLabels {
            noise,
            cutoff: F::cast(cutoff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, Array2, Axis};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn density_integrates_to_one() {
        let sorter = NoiseSorter::new().grid_points(2001);
        let (grid, density) = sorter.density(&[0., 0.1, -0.2], 0.1);
        let step = grid[1] - grid[0];
        assert_abs_diff_eq!(density.sum() * step, 1., epsilon = 1e-3);
    }

    #[test]
    fn scott_bandwidth_uses_the_sample_deviation() {
        assert_abs_diff_eq!(
            NoiseSorter::scott_bandwidth(&[0., 1., 2., 3.]).unwrap(),
            0.978_390_8,
            epsilon = 1e-6
        );
        assert_eq!(NoiseSorter::scott_bandwidth(&[0.5, 0.5, 0.5]), None);
        assert_eq!(NoiseSorter::scott_bandwidth(&[0.4]), None);
    }

    #[test]
    fn cutoff_splits_two_clusters() {
        let values = [0.9, 0.92, 0.95, 0.97, 0.05, -0.02, 0.01, 0.08];
        let cutoff = NoiseSorter::new().cutoff(&values).unwrap();
        assert!(cutoff > 0.1 && cutoff < 0.88);
    }

    #[test]
    fn single_cluster_has_no_cutoff() {
        assert_eq!(NoiseSorter::new().cutoff(&[0.9, 0.91, 0.92]), None);
        assert_eq!(NoiseSorter::new().cutoff(&[0.5]), None);
    }

    #[test]
    fn smooth_time_courses_are_signal() {
        let n_time = 300;
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let mut timecourses: Array2<f64> =
            Array::random_using((8, n_time), Uniform::new(-1., 1.), &mut rng);
        for (i, mut row) in timecourses.axis_iter_mut(Axis(0)).take(4).enumerate() {
            let freq = 0.01 * (i + 1) as f64;
            row.assign(&Array::from_shape_fn(n_time, |t| {
                (2. * std::f64::consts::PI * freq * t as f64).sin()
            }));
        }

        let labels = NoiseSorter::new().classify(timecourses.view()).unwrap();
        assert_eq!(
            labels.noise,
            ndarray::array![false, false, false, false, true, true, true, true]
        );
        assert_eq!(labels.n_signal(), 4);
    }

    #[test]
    fn unimodal_sets_use_the_fallback() {
        let timecourses = Array2::from_shape_fn((3, 100), |(i, t)| {
            (0.02 * (i + 1) as f64 * t as f64).sin()
        });
        let labels: NoiseLabels<f64> = NoiseSorter::new().classify(timecourses.view()).unwrap();
        assert_eq!(labels.cutoff, 0.5);
        assert_eq!(labels.n_noise(), 0);
    }
}
