//! Decomposition entry point
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2, Axis, CowArray, Ix2};

use super::hyperparams::{DecomposeParams, DecomposeValidParams};
use super::normalize::normalize_components;
use super::residuals::compute_residuals;
use super::result::{
    AdaptiveSummary, Decomposition, DecompositionPath, FixedSummary, Provenance,
};
use super::search::{adaptive_search, crop_excess_noise};
use crate::correlation::lag_n_autocorr;
use crate::error::{Result, SeasError};
use crate::linearity::approximate_linearity_transition;
use crate::movie::{check_mask, MovieShape, SpatialMask};
use crate::param_guard::ParamGuard;
use crate::traits::{IcaFactors, IcaSolver, NoiseClassifier, SvdSolver, Toolkit};
use crate::Float;

/// Run the ICA solver, retrying once at double precision if it overflows
pub(crate) fn solve_with_retry<F, I>(
    ica: &I,
    x: ArrayView2<F>,
    n_components: usize,
    w_init: Option<ArrayView2<f64>>,
    max_iter: usize,
) -> Result<IcaFactors<F>>
where
    F: Float,
    I: IcaSolver<F> + IcaSolver<f64>,
{
    let factors = match IcaSolver::<F>::solve(ica, x, n_components, w_init, max_iter) {
        Err(SeasError::SolverOverflow { precision }) if !F::is_double() => {
            warn!(
                "ICA exceeded the {} range, trying again at f64 precision",
                precision
            );
            let wide = x.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
            IcaSolver::<f64>::solve(ica, wide.view(), n_components, w_init, max_iter)?.cast()
        }
        other => other?,
    };

    let (rows, cols) = x.dim();
    if factors.sources.dim() != (rows, n_components) {
        return Err(SeasError::shape(
            "ICA sources",
            format!("{:?}", (rows, n_components)),
            format!("{:?}", factors.sources.dim()),
        ));
    }
    if factors.mixing.dim() != (cols, n_components) {
        return Err(SeasError::shape(
            "ICA mixing matrix",
            format!("{:?}", (cols, n_components)),
            format!("{:?}", factors.mixing.dim()),
        ));
    }

    Ok(factors)
}

impl DecomposeValidParams {
    /// Decompose a `(pixels, time)` signal matrix into independent spatial components
    ///
    /// With a mask, `matrix` may hold either every pixel of the frame, in which case it is cropped
    /// to the mask first, or only the active pixels.
    ///
    /// # Errors
    ///
    /// [`SeasError::ShapeMismatch`] when the matrix, the movie shape and the mask disagree, or
    /// when a solver returns factors of the wrong shape. Solver and classifier failures are
    /// propagated; a failed residual summary is logged and left out.
    pub fn decompose<F, S, I, C>(
        &self,
        matrix: ArrayView2<F>,
        shape: MovieShape,
        mask: Option<&SpatialMask>,
        toolkit: &Toolkit<S, I, C>,
    ) -> Result<Decomposition<F>>
    where
        F: Float,
        S: SvdSolver<F>,
        I: IcaSolver<F> + IcaSolver<f64>,
        C: NoiseClassifier<F>,
    {
        info!("calculating eigenspace of a {:?} signal matrix", matrix.dim());
        check_mask(&shape, mask)?;
        if matrix.ncols() != shape.time {
            return Err(SeasError::shape(
                "signal matrix columns",
                shape.time,
                matrix.ncols(),
            ));
        }

        let matrix = crop_to_mask(matrix, &shape, mask)?;
        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or_else(|| SeasError::InvalidValue("signal matrix has no pixels".into()))?;
        let centered = &matrix - &mean;
        let rows = centered.nrows();

        let started = Instant::now();
        let (eig_vec, eig_mix, noise, cutoff, path) = match self.n_components() {
            None => {
                info!("calculating ICA with the adaptive component estimator");
                let (u, svd_eigval) = toolkit.svd.left_singular(centered.view())?;

                let transition = match approximate_linearity_transition(&svd_eigval) {
                    Ok(transition) => transition,
                    Err(err) => {
                        warn!("{}, treating the whole spectrum as signal", err);
                        svd_eigval.len()
                    }
                };
                let ceiling = shape.time.min(rows).min(u.ncols());
                let initial = (transition as f64 * self.svd_multiplier()).round() as usize;
                debug!(
                    "linearity transition at {}, starting from {} components",
                    transition, initial
                );

                let outcome = adaptive_search(
                    centered.view(),
                    &u,
                    initial,
                    ceiling,
                    self.signal_target(),
                    self.max_iter(),
                    &toolkit.ica,
                    &toolkit.classifier,
                )?;

                let svd_cutoff = outcome.factors.n_components();
                let increased_cutoff = outcome.increased_cutoff();
                let lag1_full = lag_n_autocorr(&outcome.factors.mixing.t(), 1);
                let cropped = crop_excess_noise(
                    outcome.factors,
                    outcome.labels.noise,
                    lag1_full,
                    self.crop_ratio(),
                );

                let summary = AdaptiveSummary {
                    svd_eigval,
                    transition,
                    svd_multiplier: self.svd_multiplier(),
                    svd_cutoff,
                    increased_cutoff,
                    lag1_full: cropped.lag1_full,
                    termination: outcome.termination,
                    signal_fraction: outcome.signal_fraction,
                    component_history: outcome.history,
                };
                (
                    cropped.eig_vec,
                    cropped.eig_mix,
                    cropped.noise,
                    outcome.labels.cutoff,
                    DecompositionPath::Adaptive(summary),
                )
            }
            Some(n_components) => {
                info!("calculating ICA with {} components", n_components);
                let ceiling = shape.time.min(rows);
                if n_components > ceiling {
                    return Err(SeasError::InvalidValue(format!(
                        "cannot extract {} components from a {:?} signal matrix",
                        n_components,
                        centered.dim()
                    )));
                }

                let factors = solve_with_retry(
                    &toolkit.ica,
                    centered.view(),
                    n_components,
                    None,
                    self.max_iter(),
                )?;
                let (eig_vec, eig_mix, flipped) = normalize_components(factors);

                let labels = toolkit.classifier.classify(eig_mix.t())?;
                if labels.noise.len() != n_components {
                    return Err(SeasError::shape(
                        "noise labels",
                        n_components,
                        labels.noise.len(),
                    ));
                }
                (
                    eig_vec,
                    eig_mix,
                    labels.noise,
                    labels.cutoff,
                    DecompositionPath::Fixed(FixedSummary { flipped }),
                )
            }
        };
        let time_elapsed = started.elapsed().as_secs_f64();
        info!("independent component analysis took {:.3} sec", time_elapsed);
        debug!("components shape: {:?}", eig_vec.dim());

        let now = chrono::Utc::now();
        let provenance = Provenance {
            time_elapsed,
            timestamp: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            date: now.format("%y%m%d").to_string(),
            n_components: eig_vec.ncols(),
        };

        let mut decomposition = Decomposition::from_parts(
            mean,
            shape,
            mask.cloned(),
            eig_vec,
            eig_mix,
            noise,
            cutoff,
            path,
            provenance,
        )?;

        if self.calc_residuals() {
            match compute_residuals(centered.view(), &decomposition) {
                Ok(residuals) => decomposition.residuals = Some(residuals),
                Err(err) => warn!("residual calculation failed: {}", err),
            }
        }

        Ok(decomposition)
    }
}

impl DecomposeParams {
    /// Check the parameters and decompose, see [`DecomposeValidParams::decompose`]
    pub fn decompose<F, S, I, C>(
        &self,
        matrix: ArrayView2<F>,
        shape: MovieShape,
        mask: Option<&SpatialMask>,
        toolkit: &Toolkit<S, I, C>,
    ) -> Result<Decomposition<F>>
    where
        F: Float,
        S: SvdSolver<F>,
        I: IcaSolver<F> + IcaSolver<f64>,
        C: NoiseClassifier<F>,
    {
        self.check_ref()?.decompose(matrix, shape, mask, toolkit)
    }
}

fn crop_to_mask<'a, F: Float>(
    matrix: ArrayView2<'a, F>,
    shape: &MovieShape,
    mask: Option<&SpatialMask>,
) -> Result<CowArray<'a, F, Ix2>> {
    match mask {
        None if matrix.nrows() == shape.n_pixels() => Ok(CowArray::from(matrix)),
        None => Err(SeasError::shape(
            "signal matrix rows",
            shape.n_pixels(),
            matrix.nrows(),
        )),
        Some(mask) if matrix.nrows() == mask.n_active() => Ok(CowArray::from(matrix)),
        Some(mask) => {
            info!(
                "using mask to crop signal matrix from {} to {} rows",
                matrix.nrows(),
                mask.n_active()
            );
            let cropped: Array2<F> = mask.crop_rows(matrix)?;
            Ok(CowArray::from(cropped))
        }
    }
}
