//! Fast algorithm for Independent Component Analysis (ICA)

use linfa_linalg::eigh::{EigSort, Eigh};
use log::debug;
use ndarray::{Array, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
use seas::traits::{IcaFactors, IcaSolver};
use seas::Float;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{FastIcaError, Result};
use crate::hyperparams::FastIcaValidParams;

impl FastIcaValidParams {
    /// Fit the model
    ///
    /// # Errors
    ///
    /// If the [`FastIcaValidParams::ncomponents`] is set to a number greater than the minimum of
    /// the number of rows and columns
    ///
    /// If a non-finite value appears while whitening or optimising, reported as
    /// [`FastIcaError::Overflow`] with the precision of `F`
    pub fn fit<F: Float, D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Result<FastIca<F>> {
        self.fit_with(x.view(), *self.ncomponents(), None, self.max_iter())
    }

    /// Fit the model starting from the unmixing matrix `w_init`
    ///
    /// `w_init` must have shape `(ncomponents, ncomponents)`.
    pub fn fit_from<F: Float, D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        w_init: ArrayView2<f64>,
    ) -> Result<FastIca<F>> {
        self.fit_with(x.view(), *self.ncomponents(), Some(w_init), self.max_iter())
    }

    fn fit_with<F: Float>(
        &self,
        x: ArrayView2<F>,
        ncomponents: Option<usize>,
        w_init: Option<ArrayView2<f64>>,
        max_iter: usize,
    ) -> Result<FastIca<F>> {
        let (nsamples, nfeatures) = x.dim();
        if nsamples == 0 {
            return Err(FastIcaError::NotEnoughSamples);
        }

        // If the number of components is not set, we take the minimum of
        // the number of rows and columns
        let ncomponents = ncomponents.unwrap_or_else(|| nsamples.min(nfeatures));
        if ncomponents == 0 || ncomponents > nsamples.min(nfeatures) {
            return Err(FastIcaError::InvalidValue(format!(
                "ncomponents must be between 1 and min({}, {}), got {}",
                nsamples, nfeatures, ncomponents
            )));
        }

        let xmean = x
            .mean_axis(Axis(0))
            .ok_or(FastIcaError::NotEnoughSamples)?;
        // features along the rows from here on
        let xcentered = (&x - &xmean.view().insert_axis(Axis(0))).reversed_axes();

        let k = whitening(&xcentered, ncomponents)?;
        let mut xwhitened = k.dot(&xcentered);

        // We multiply the matrix with root of the number of records
        let nsamples_sqrt = F::cast(nsamples).sqrt();
        xwhitened.mapv_inplace(|x| x * nsamples_sqrt);
        ensure_finite(&xwhitened)?;

        let w = match w_init {
            Some(w) if w.dim() != (ncomponents, ncomponents) => {
                return Err(FastIcaError::InvalidValue(format!(
                    "w_init must have shape ({}, {}), got {:?}",
                    ncomponents,
                    ncomponents,
                    w.dim()
                )));
            }
            Some(w) => w.mapv(F::cast),
            None => {
                // We initialize the de-mixing matrix with a uniform distribution
                let w: Array2<f64> = if let Some(seed) = self.random_state() {
                    let mut rng = Xoshiro256Plus::seed_from_u64(*seed as u64);
                    Array::random_using((ncomponents, ncomponents), Uniform::new(0., 1.), &mut rng)
                } else {
                    Array::random((ncomponents, ncomponents), Uniform::new(0., 1.))
                };
                w.mapv(F::cast)
            }
        };

        let (w, n_iter) = self.ica_parallel(&xwhitened, &w, max_iter)?;

        // We whiten the de-mixing matrix
        let components = w.dot(&k);
        ensure_finite(&components)?;
        let mixing = pseudo_inverse(&components)?;
        ensure_finite(&mixing)?;

        debug!(
            "FastICA extracted {} components from {}x{} input in {} iterations",
            ncomponents, nsamples, nfeatures, n_iter
        );

        Ok(FastIca {
            mean: xmean,
            components,
            mixing,
            n_iter,
        })
    }

    // Parallel FastICA, Optimization step
    fn ica_parallel<F: Float>(
        &self,
        x: &Array2<F>,
        w: &Array2<F>,
        max_iter: usize,
    ) -> Result<(Array2<F>, usize)> {
        let mut w = sym_decorrelation(w)?;

        let p = F::cast(x.ncols());
        let tol = F::cast(self.tol());

        for iter in 0..max_iter {
            let (gwtx, g_wtx) = self.gfunc().exec(&w.dot(x));

            let lhs = gwtx.dot(&x.t()).mapv(|x| x / p);
            let rhs = &w * &g_wtx.insert_axis(Axis(1));
            let wnew = sym_decorrelation(&(lhs - rhs))?;

            // `lim` let us check for convergence between the old and
            // new weight values, we want their dot-product to almost equal one
            let lim = *wnew
                .outer_iter()
                .zip(w.outer_iter())
                .map(|(a, b)| (a.dot(&b).abs() - F::one()).abs())
                .collect::<Array1<F>>()
                .max()
                .map_err(|_| FastIcaError::Overflow(F::PRECISION))?;

            w = wnew;

            if lim < tol {
                return Ok((w, iter + 1));
            }
        }

        debug!("FastICA did not converge in {} iterations", max_iter);
        Ok((w, max_iter))
    }
}

/// Whitening matrix `(ncomponents, features)` from the eigen-decomposition of the feature
/// covariance of `xcentered`, which holds one feature per row
fn whitening<F: Float>(xcentered: &Array2<F>, ncomponents: usize) -> Result<Array2<F>> {
    let covariance = xcentered.dot(&xcentered.t());
    ensure_finite(&covariance)?;

    let (eig_val, eig_vec) = covariance.eigh()?.sort_eig_desc();
    let largest = eig_val.iter().fold(F::zero(), |acc, &v| acc.max(v));
    // degenerate directions are lifted to the machine precision
    let floor = F::epsilon() * largest.max(F::one());
    let scale = eig_val
        .slice(s![..ncomponents])
        .mapv(|v| v.max(floor).sqrt());

    Ok((eig_vec.slice(s![.., ..ncomponents]).to_owned() / &scale).reversed_axes())
}

fn sym_decorrelation<F: Float>(w: &Array2<F>) -> Result<Array2<F>> {
    ensure_finite(w)?;
    let (eig_val, eig_vec) = w.dot(&w.t()).eigh()?;

    // We lower bound the float value at 1e-7 when taking the reciprocal
    let lower_bound = F::cast(1e-7);
    let scale = eig_val.mapv(|v| v.sqrt().max(lower_bound).recip());

    Ok((&eig_vec * &scale.insert_axis(Axis(0)))
        .dot(&eig_vec.t())
        .dot(w))
}

/// Pseudo-inverse `Cᵀ (C Cᵀ)⁻¹` of a full row rank matrix
fn pseudo_inverse<F: Float>(c: &Array2<F>) -> Result<Array2<F>> {
    let (eig_val, eig_vec) = c.dot(&c.t()).eigh()?;
    let largest = eig_val.iter().fold(F::zero(), |acc, &v| acc.max(v));
    let floor = F::epsilon() * largest;
    let scale = eig_val.mapv(|v| v.max(floor).recip());

    let gram_inv = (&eig_vec * &scale.insert_axis(Axis(0))).dot(&eig_vec.t());
    Ok(c.t().dot(&gram_inv))
}

fn ensure_finite<F: Float, D: Dimension>(a: &Array<F, D>) -> Result<()> {
    if a.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(FastIcaError::Overflow(F::PRECISION))
    }
}

/// Fitted FastICA model for recovering the sources
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FastIca<F> {
    mean: Array1<F>,
    components: Array2<F>,
    mixing: Array2<F>,
    n_iter: usize,
}

impl<F: Float> FastIca<F> {
    /// Feature means removed before fitting
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Unmixing matrix `(ncomponents, features)`, whitening included
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Mixing matrix `(features, ncomponents)`
    pub fn mixing(&self) -> &Array2<F> {
        &self.mixing
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Recover the sources
    pub fn transform<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        if x.ncols() != self.mean.len() {
            return Err(FastIcaError::InvalidValue(format!(
                "expected {} features, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }

        let xcentered = x - &self.mean.view().insert_axis(Axis(0));
        Ok(xcentered.dot(&self.components.t()))
    }

    /// Mix the sources back into the feature space
    pub fn inverse_transform<D: Data<Elem = F>>(&self, sources: &ArrayBase<D, Ix2>) -> Array2<F> {
        sources.dot(&self.mixing.t()) + &self.mean.view().insert_axis(Axis(0))
    }
}

impl<F: Float> IcaSolver<F> for FastIcaValidParams {
    fn solve(
        &self,
        x: ArrayView2<F>,
        n_components: usize,
        w_init: Option<ArrayView2<f64>>,
        max_iter: usize,
    ) -> seas::error::Result<IcaFactors<F>> {
        let model = self.fit_with(x, Some(n_components), w_init, max_iter)?;
        let sources = model.transform(&x)?;
        ensure_finite(&sources)?;

        Ok(IcaFactors {
            sources,
            mixing: model.mixing,
        })
    }
}

/// Some standard non-linear functions
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum GFunc {
    Logcosh(f64),
    Exp,
    Cube,
}

impl GFunc {
    // Function to select the correct non-linear function and execute it
    // returning a tuple, consisting of the first and second derivatives of the
    // non-linear function
    fn exec<A: Float>(&self, x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        match self {
            Self::Cube => Self::cube(x),
            Self::Exp => Self::exp(x),
            Self::Logcosh(alpha) => Self::logcosh(x, *alpha),
        }
    }

    fn row_mean<A: Float>(x: Array2<A>) -> Array1<A> {
        let n = A::cast(x.ncols());
        x.sum_axis(Axis(1)).mapv(|v| v / n)
    }

    fn cube<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        (
            x.mapv(|x| x.powi(3)),
            Self::row_mean(x.mapv(|x| A::cast(3.) * x.powi(2))),
        )
    }

    fn exp<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        let exp = x.mapv(|x| (-x.powi(2) / A::cast(2.)).exp());
        (
            x * &exp,
            Self::row_mean(x.mapv(|x| A::one() - x.powi(2)) * &exp),
        )
    }

    fn logcosh<A: Float>(x: &Array2<A>, alpha: f64) -> (Array2<A>, Array1<A>) {
        let alpha = A::cast(alpha);

        let gx = x.mapv(|x| (x * alpha).tanh());
        let g_x = gx.mapv(|x| alpha * (A::one() - x.powi(2)));

        (gx, Self::row_mean(g_x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use seas::ParamGuard;

    use crate::hyperparams::FastIcaParams;
    use ndarray_rand::rand_distr::StudentT;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<FastIca<f64>>();
        has_autotraits::<GFunc>();
        has_autotraits::<FastIcaParams>();
        has_autotraits::<FastIcaValidParams>();
        has_autotraits::<FastIcaError>();
    }

    fn uniform(shape: (usize, usize), seed: u64) -> Array2<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        Array::random_using(shape, Uniform::new(-1., 1.), &mut rng)
    }

    // Test to make sure the number of components set cannot be greater
    // that the minimum of the number of rows and columns of the input
    #[test]
    fn test_ncomponents_err() {
        let input = uniform((4, 4), 42);
        let ica = FastIcaParams::new().ncomponents(100).check_unwrap();
        assert!(matches!(
            ica.fit(&input),
            Err(FastIcaError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_w_init_shape_err() {
        let input = uniform((20, 4), 42);
        let ica = FastIcaParams::new().ncomponents(2).check_unwrap();
        let w_init = Array2::<f64>::eye(3);
        assert!(matches!(
            ica.fit_from(&input, w_init.view()),
            Err(FastIcaError::InvalidValue(_))
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        let input = Array2::<f64>::zeros((0, 3));
        let ica = FastIcaParams::new().check_unwrap();
        assert!(matches!(
            ica.fit(&input),
            Err(FastIcaError::NotEnoughSamples)
        ));
    }

    #[test]
    fn non_finite_input_overflows() {
        let mut input = uniform((20, 3), 3).mapv(|v| v as f32);
        input[[4, 1]] = f32::INFINITY;
        let ica = FastIcaParams::new().check_unwrap();
        let err = ica.solve(input.view(), 2, None, 10).unwrap_err();
        assert_eq!(err, seas::error::SeasError::SolverOverflow { precision: "f32" });
    }

    #[test]
    fn full_rank_factors_rebuild_the_centered_input() {
        let x = uniform((200, 3), 7);
        let ica = FastIcaParams::new().check_unwrap();
        let factors = ica.solve(x.view(), 3, None, 200).unwrap();

        assert_eq!(factors.sources.dim(), (200, 3));
        assert_eq!(factors.mixing.dim(), (3, 3));

        let centered = &x - &x.mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(
            factors.sources.dot(&factors.mixing.t()),
            centered,
            epsilon = 1e-6
        );
    }

    #[test]
    fn model_round_trips_through_the_mixing_matrix() {
        let x = uniform((100, 4), 11);
        let model = FastIcaParams::new().check_unwrap().fit(&x).unwrap();

        let sources = model.transform(&x).unwrap();
        assert_abs_diff_eq!(model.inverse_transform(&sources), x, epsilon = 1e-6);
        assert!(model.n_iter() >= 1);
        assert!(model.transform(&uniform((5, 3), 1)).is_err());
    }

    #[test]
    fn w_init_makes_the_result_reproducible() {
        let x = uniform((150, 5), 5);
        let ica = FastIcaParams::new().random_seed().check_unwrap();
        let w_init = array![[1., 0.5], [0.2, 1.]];

        let first = ica.solve(x.view(), 2, Some(w_init.view()), 50).unwrap();
        let second = ica.solve(x.view(), 2, Some(w_init.view()), 50).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_precision_is_supported() {
        let x = uniform((200, 4), 9).mapv(|v| v as f32);
        let ica = FastIcaParams::new().check_unwrap();
        let factors = ica.solve(x.view(), 2, None, 200).unwrap();

        assert_eq!(factors.sources.dim(), (200, 2));
        assert_eq!(factors.mixing.dim(), (4, 2));
        assert!(factors.sources.iter().all(|v| v.is_finite()));
    }

    // Helper macro that produces test-cases with the pattern test_fast_ica_*
    macro_rules! fast_ica_tests {
        ($($name:ident: $gfunc:expr,)*) => {
            paste::item! {
                $(
                    #[test]
                    fn [<test_fast_ica_$name>]() {
                        test_fast_ica($gfunc);
                    }
                )*
            }
        }
    }

    // Tests to make sure all of the `GFunc`'s non-linear functions and the
    // model itself performs well
    fast_ica_tests! {
        exp: GFunc::Exp, cube: GFunc::Cube, logcosh: GFunc::Logcosh(1.0),
    }

    // Mixes a square wave with heavy tailed noise and makes sure FastICA recovers the square
    // wave with considerable accuracy
    fn test_fast_ica(gfunc: GFunc) {
        let nsamples = 1000;

        // Center the data and make it have unit variance
        let center_and_norm = |s: &mut Array2<f64>| {
            let mean = s.mean_axis(Axis(0)).unwrap();
            *s -= &mean.insert_axis(Axis(0));
            let std = s.std_axis(Axis(0), 0.);
            *s /= &std.insert_axis(Axis(0));
        };

        let mut source1 = Array::linspace(0f64, 100., nsamples);
        source1.mapv_inplace(|x| if 2. * x.sin() > 0. { 0. } else { -1. });

        // Creating noise using Student T distribution
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let source2 = Array::random_using((nsamples, 1), StudentT::new(1.0).unwrap(), &mut rng);

        let mut sources = concatenate![Axis(1), source1.insert_axis(Axis(1)), source2];
        center_and_norm(&mut sources);

        let phi: f64 = 0.6;
        let mixing = array![[phi.cos(), phi.sin()], [phi.sin(), -phi.cos()]];
        let mixed = sources.dot(&mixing.t());

        let ica = FastIcaParams::new()
            .ncomponents(2)
            .gfunc(gfunc)
            .random_state(42)
            .check_unwrap();
        let model = ica.fit(&mixed).unwrap();
        let mut output = model.transform(&mixed).unwrap();
        center_and_norm(&mut output);

        assert_eq!(output.shape(), &[1000, 2]);

        // The order and sign of the recovered sources is arbitrary
        let square = sources.column(0);
        let similarity = output
            .columns()
            .into_iter()
            .map(|c| square.dot(&c).abs() / nsamples as f64)
            .fold(0., f64::max);

        assert!(similarity > 0.9);
    }
}
