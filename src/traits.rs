//! Capabilities consumed by the decomposition and reconstruction pipeline
//!
//! The numerical solvers, the noise classifier and the time course filters are injected through
//! these traits. Default implementations live in the `seas-ica` and `seas-signal` crates; tests
//! substitute deterministic stand-ins.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::Result;
use crate::Float;

/// Spatial and temporal factors returned by an ICA solver
///
/// For an input of shape `(rows, cols)` the `sources` have shape `(rows, n_components)` and the
/// `mixing` matrix has shape `(cols, n_components)`, such that `sources · mixingᵀ` approximates
/// the column-centered input.
#[derive(Debug, Clone, PartialEq)]
pub struct IcaFactors<F> {
    pub sources: Array2<F>,
    pub mixing: Array2<F>,
}

impl<F: Float> IcaFactors<F> {
    pub fn n_components(&self) -> usize {
        self.sources.ncols()
    }

    /// Convert the factors to another precision
    pub fn cast<G: Float>(&self) -> IcaFactors<G> {
        IcaFactors {
            sources: self.sources.mapv(G::cast),
            mixing: self.mixing.mapv(G::cast),
        }
    }
}

/// Noise labels of a set of time courses
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseLabels<F> {
    /// One flag per time course, `true` when classified as noise
    pub noise: Array1<bool>,
    /// Decision threshold used by the classifier
    pub cutoff: F,
}

impl<F> NoiseLabels<F> {
    pub fn n_noise(&self) -> usize {
        self.noise.iter().filter(|&&n| n).count()
    }

    pub fn n_signal(&self) -> usize {
        self.noise.len() - self.n_noise()
    }

    /// Proportion of time courses classified as signal
    pub fn signal_fraction(&self) -> f64 {
        if self.noise.is_empty() {
            return 0.0;
        }
        self.n_signal() as f64 / self.noise.len() as f64
    }
}

pub trait SvdSolver<F: Float> {
    /// Left singular vectors `(rows, k)` and singular values `(k)` in descending order, with
    /// `k = min(rows, cols)`
    fn left_singular(&self, x: ArrayView2<F>) -> Result<(Array2<F>, Array1<F>)>;
}

pub trait IcaSolver<F: Float> {
    /// Decompose `x` into `n_components` independent components along its rows
    ///
    /// `w_init`, when given, is the `(n_components, n_components)` initial unmixing matrix.
    /// Numeric overflow must be reported as [`SolverOverflow`](crate::error::SeasError::SolverOverflow).
    fn solve(
        &self,
        x: ArrayView2<F>,
        n_components: usize,
        w_init: Option<ArrayView2<f64>>,
        max_iter: usize,
    ) -> Result<IcaFactors<F>>;
}

pub trait NoiseClassifier<F: Float> {
    /// Label every row of a `(n_components, time)` matrix as noise or signal
    fn classify(&self, timecourses: ArrayView2<F>) -> Result<NoiseLabels<F>>;
}

/// Frequency band of a Butterworth filter, in Hz
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// Remove slow drift below the cutoff
    HighPass(f64),
    /// Remove fast fluctuation above the cutoff
    LowPass(f64),
    /// Keep the band between the two cutoffs
    BandPass(f64, f64),
}

pub trait TimecourseFilter<F: Float> {
    fn butterworth(&self, signal: ArrayView1<F>, band: Band, fps: f64) -> Result<Array1<F>>;

    /// Time-frequency denoising which keeps structure with periods above `upper_period` seconds
    fn denoise(&self, signal: ArrayView1<F>, fps: f64, upper_period: f64) -> Result<Array1<F>>;
}

/// The three capabilities needed by a decomposition
#[derive(Debug, Clone)]
pub struct Toolkit<S, I, C> {
    pub svd: S,
    pub ica: I,
    pub classifier: C,
}

impl<S, I, C> Toolkit<S, I, C> {
    pub fn new(svd: S, ica: I, classifier: C) -> Self {
        Toolkit {
            svd,
            ica,
            classifier,
        }
    }
}
