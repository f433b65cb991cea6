use crate::{error::FastIcaError, fast_ica::GFunc};
use seas::ParamGuard;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Fast Independent Component Analysis (ICA)
///
/// The parameters do not depend on the float type, so the same checked parameters solve both
/// `f32` and `f64` signal matrices.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub struct FastIcaValidParams {
    ncomponents: Option<usize>,
    gfunc: GFunc,
    max_iter: usize,
    tol: f64,
    random_state: Option<usize>,
}

impl FastIcaValidParams {
    pub fn ncomponents(&self) -> &Option<usize> {
        &self.ncomponents
    }

    pub fn gfunc(&self) -> &GFunc {
        &self.gfunc
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn random_state(&self) -> &Option<usize> {
        &self.random_state
    }
}

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub struct FastIcaParams(FastIcaValidParams);

impl Default for FastIcaParams {
    fn default() -> Self {
        Self::new()
    }
}

impl FastIcaParams {
    /// Create new FastICA algorithm with default values for its parameters
    pub fn new() -> Self {
        Self(FastIcaValidParams {
            ncomponents: None,
            gfunc: GFunc::Logcosh(1.),
            max_iter: 200,
            tol: 1e-4,
            random_state: Some(1000),
        })
    }

    /// Set the number of components to use, if not set all are used
    pub fn ncomponents(mut self, ncomponents: usize) -> Self {
        self.0.ncomponents = Some(ncomponents);
        self
    }

    /// G function used in the approximation to neg-entropy, refer [`GFunc`]
    pub fn gfunc(mut self, gfunc: GFunc) -> Self {
        self.0.gfunc = gfunc;
        self
    }

    /// Set maximum number of iterations during fit
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set tolerance on update at each iteration
    pub fn tol(mut self, tol: f64) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set seed for random number generator for reproducible results.
    pub fn random_state(mut self, random_state: usize) -> Self {
        self.0.random_state = Some(random_state);
        self
    }

    /// Draw the initial unmixing matrix from the thread rng
    pub fn random_seed(mut self) -> Self {
        self.0.random_state = None;
        self
    }
}

impl ParamGuard for FastIcaParams {
    type Checked = FastIcaValidParams;
    type Error = FastIcaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.tol.is_nan() || self.0.tol < 0. {
            return Err(FastIcaError::InvalidTolerance(self.0.tol as f32));
        }
        if self.0.max_iter == 0 {
            return Err(FastIcaError::InvalidValue(
                "max_iter must be at least one".to_string(),
            ));
        }
        if self.0.ncomponents == Some(0) {
            return Err(FastIcaError::InvalidValue(
                "ncomponents must be at least one".to_string(),
            ));
        }
        if let GFunc::Logcosh(alpha) = self.0.gfunc {
            if !(1.0..=2.0).contains(&alpha) {
                return Err(FastIcaError::InvalidValue(format!(
                    "alpha must be between 1 and 2 inclusive, got {}",
                    alpha
                )));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
