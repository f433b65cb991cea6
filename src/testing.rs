//! Deterministic stand-ins for the injected solvers
use std::f64::consts::PI;

use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, SeasError};
use crate::traits::{
    Band, IcaFactors, IcaSolver, NoiseClassifier, NoiseLabels, SvdSolver, TimecourseFilter,
};
use crate::Float;

/// Returns the columns of the identity as singular vectors along with a fixed spectrum
pub struct ScriptedSvd(pub Array1<f64>);

impl<F: Float> SvdSolver<F> for ScriptedSvd {
    fn left_singular(&self, x: ArrayView2<F>) -> Result<(Array2<F>, Array1<F>)> {
        let k = self.0.len();
        let u = Array::from_shape_fn((x.nrows(), k), |(i, j)| if i == j { F::one() } else { F::zero() });

        Ok((u, self.0.mapv(F::cast)))
    }
}

/// Knows the true factors of the synthetic matrix and pads them with silent components
#[derive(Clone)]
pub struct OracleIca {
    pub sources: Array2<f64>,
    pub mixing: Array2<f64>,
}

impl<F: Float> IcaSolver<F> for OracleIca {
    fn solve(
        &self,
        x: ArrayView2<F>,
        n_components: usize,
        _w_init: Option<ArrayView2<f64>>,
        _max_iter: usize,
    ) -> Result<IcaFactors<F>> {
        let known = self.sources.ncols();
        let mut sources = Array2::zeros((x.nrows(), n_components));
        let mut mixing = Array2::zeros((x.ncols(), n_components));
        for k in 0..n_components.min(known) {
            sources.column_mut(k).assign(&self.sources.column(k).mapv(F::cast));
            mixing.column_mut(k).assign(&self.mixing.column(k).mapv(F::cast));
        }

        Ok(IcaFactors { sources, mixing })
    }
}

/// Overflows at single precision only
pub struct NarrowOverflow(pub OracleIca);

impl IcaSolver<f32> for NarrowOverflow {
    fn solve(
        &self,
        _x: ArrayView2<f32>,
        _n_components: usize,
        _w_init: Option<ArrayView2<f64>>,
        _max_iter: usize,
    ) -> Result<IcaFactors<f32>> {
        Err(SeasError::SolverOverflow { precision: "f32" })
    }
}

impl IcaSolver<f64> for NarrowOverflow {
    fn solve(
        &self,
        x: ArrayView2<f64>,
        n_components: usize,
        w_init: Option<ArrayView2<f64>>,
        max_iter: usize,
    ) -> Result<IcaFactors<f64>> {
        IcaSolver::<f64>::solve(&self.0, x, n_components, w_init, max_iter)
    }
}

/// Labels every time course without spread as noise
pub struct FlatIsNoise;

impl<F: Float> NoiseClassifier<F> for FlatIsNoise {
    fn classify(&self, timecourses: ArrayView2<F>) -> Result<NoiseLabels<F>> {
        let cutoff = F::cast(1e-9);
        let noise = timecourses
            .std_axis(Axis(1), F::zero())
            .mapv(|s| s < cutoff);

        Ok(NoiseLabels { noise, cutoff })
    }
}

/// Replaces every filtered signal with a marker so the applied branch can be checked
pub struct MarkerFilter;

impl<F: Float> TimecourseFilter<F> for MarkerFilter {
    fn butterworth(&self, signal: ArrayView1<F>, band: Band, _fps: f64) -> Result<Array1<F>> {
        let marker = match band {
            Band::HighPass(_) => 1.,
            Band::LowPass(_) => 2.,
            Band::BandPass(_, _) => 3.,
        };
        Ok(signal.mapv(|v| v * F::cast(0.5) + F::cast(marker)))
    }

    fn denoise(&self, signal: ArrayView1<F>, _fps: f64, upper_period: f64) -> Result<Array1<F>> {
        Ok(signal.mapv(|_| F::cast(upper_period)))
    }
}

/// Three zero-mean orthogonal patterns over 100 pixels, each with its own time course over
/// 20 frames, added to a common baseline
pub struct Synthetic {
    pub matrix: Array2<f64>,
    pub centered: Array2<f64>,
    pub baseline: Array1<f64>,
    pub oracle: OracleIca,
}

pub fn synthetic() -> Synthetic {
    let (pixels, time) = (100, 20);
    let sources = Array::from_shape_fn((pixels, 3), |(i, k)| {
        let phase = 2. * PI * i as f64 / pixels as f64;
        match k {
            0 => phase.cos(),
            1 => phase.sin(),
            _ => (2. * phase).cos(),
        }
    });
    let mixing = Array::from_shape_fn((time, 3), |(t, k)| {
        let t = t as f64;
        match k {
            0 => 3. * (0.7 * t).sin(),
            1 => 2. * (0.3 * t + 1.).cos(),
            _ => (1.9 * t).sin() + 0.1,
        }
    });
    let baseline = Array::from_shape_fn(time, |t| 10. + 0.2 * t as f64);

    let centered = sources.dot(&mixing.t());
    let matrix = &centered + &baseline;

    Synthetic {
        matrix,
        centered,
        baseline,
        oracle: OracleIca { sources, mixing },
    }
}
