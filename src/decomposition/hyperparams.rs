use crate::error::SeasError;
use crate::param_guard::ParamGuard;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Decomposition parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposeValidParams {
    n_components: Option<usize>,
    svd_multiplier: f64,
    calc_residuals: bool,
    max_iter: usize,
    signal_target: f64,
    crop_ratio: f64,
}

impl DecomposeValidParams {
    pub fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    pub fn svd_multiplier(&self) -> f64 {
        self.svd_multiplier
    }

    pub fn calc_residuals(&self) -> bool {
        self.calc_residuals
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn signal_target(&self) -> f64 {
        self.signal_target
    }

    pub fn crop_ratio(&self) -> f64 {
        self.crop_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposeParams(DecomposeValidParams);

impl Default for DecomposeParams {
    fn default() -> Self {
        Self::new()
    }
}

impl DecomposeParams {
    /// Adaptive component count with default values for every parameter
    pub fn new() -> Self {
        Self(DecomposeValidParams {
            n_components: None,
            svd_multiplier: 5.0,
            calc_residuals: true,
            max_iter: 1000,
            signal_target: 0.75,
            crop_ratio: 1.25,
        })
    }

    /// Request an exact number of components, bypassing the adaptive search
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.0.n_components = Some(n_components);
        self
    }

    /// Go back to choosing the number of components adaptively
    pub fn adaptive(mut self) -> Self {
        self.0.n_components = None;
        self
    }

    /// Factor applied to the linearity transition of the SVD spectrum to seed the search
    pub fn svd_multiplier(mut self, svd_multiplier: f64) -> Self {
        self.0.svd_multiplier = svd_multiplier;
        self
    }

    /// Whether to summarise the signal lost by the decomposition
    pub fn calc_residuals(mut self, calc_residuals: bool) -> Self {
        self.0.calc_residuals = calc_residuals;
        self
    }

    /// Maximum number of iterations of the ICA solver
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Signal fraction below which the adaptive search stops growing
    pub fn signal_target(mut self, signal_target: f64) -> Self {
        self.0.signal_target = signal_target;
        self
    }

    /// Components kept per signal component when cropping excess noise
    pub fn crop_ratio(mut self, crop_ratio: f64) -> Self {
        self.0.crop_ratio = crop_ratio;
        self
    }
}

impl ParamGuard for DecomposeParams {
    type Checked = DecomposeValidParams;
    type Error = SeasError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_components == Some(0) {
            Err(SeasError::InvalidValue(
                "n_components must be at least 1".into(),
            ))
        } else if !self.0.svd_multiplier.is_finite() || self.0.svd_multiplier <= 0.0 {
            Err(SeasError::InvalidValue(format!(
                "svd_multiplier must be positive, got {}",
                self.0.svd_multiplier
            )))
        } else if self.0.max_iter == 0 {
            Err(SeasError::InvalidValue("max_iter must be at least 1".into()))
        } else if !(self.0.signal_target > 0.0 && self.0.signal_target <= 1.0) {
            Err(SeasError::InvalidValue(format!(
                "signal_target must lie in (0, 1], got {}",
                self.0.signal_target
            )))
        } else if !self.0.crop_ratio.is_finite() || self.0.crop_ratio < 1.0 {
            Err(SeasError::InvalidValue(format!(
                "crop_ratio must be at least 1, got {}",
                self.0.crop_ratio
            )))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
