use std::fmt;
use std::str::FromStr;

use crate::error::SeasError;
use crate::param_guard::ParamGuard;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Policy applied to the mean time course before it is added back
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMethod {
    /// Butterworth high-pass at the low cutoff
    HighPass,
    /// Butterworth low-pass at the high cutoff
    LowPass,
    /// Butterworth band-pass between both cutoffs
    BandPass,
    /// Wavelet denoising keeping periods above `1 / low_cutoff`
    Denoise,
    /// Replace the mean time course by its average
    Constant,
}

impl FilterMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FilterMethod::HighPass => "butterworth_highpass",
            FilterMethod::LowPass => "butterworth_lowpass",
            FilterMethod::BandPass => "butterworth_bandpass",
            FilterMethod::Denoise => "wavelet",
            FilterMethod::Constant => "constant",
        }
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterMethod {
    type Err = SeasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "butterworth" | "butterworth_highpass" | "highpass" => Ok(FilterMethod::HighPass),
            "butterworth_lowpass" | "lowpass" => Ok(FilterMethod::LowPass),
            "butterworth_bandpass" | "bandpass" => Ok(FilterMethod::BandPass),
            "wavelet" | "denoise" => Ok(FilterMethod::Denoise),
            "constant" => Ok(FilterMethod::Constant),
            _ => Err(SeasError::UnsupportedFilter(s.to_string())),
        }
    }
}

/// Reconstruction parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebuildValidParams {
    apply_mean_filter: bool,
    mean_low_cutoff: f64,
    mean_high_cutoff: f64,
    apply_component_filter: bool,
    component_high_cutoff: f64,
    apply_masked_mean: bool,
    filter_method: FilterMethod,
    fps: f64,
    include_noise: bool,
}

impl RebuildValidParams {
    pub fn apply_mean_filter(&self) -> bool {
        self.apply_mean_filter
    }

    pub fn mean_low_cutoff(&self) -> f64 {
        self.mean_low_cutoff
    }

    pub fn mean_high_cutoff(&self) -> f64 {
        self.mean_high_cutoff
    }

    pub fn apply_component_filter(&self) -> bool {
        self.apply_component_filter
    }

    pub fn component_high_cutoff(&self) -> f64 {
        self.component_high_cutoff
    }

    pub fn apply_masked_mean(&self) -> bool {
        self.apply_masked_mean
    }

    pub fn filter_method(&self) -> FilterMethod {
        self.filter_method
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn include_noise(&self) -> bool {
        self.include_noise
    }

    /// Same settings, with noise components kept whatever the selection
    pub(crate) fn with_noise(&self) -> Self {
        RebuildValidParams {
            include_noise: true,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebuildParams(RebuildValidParams);

impl Default for RebuildParams {
    fn default() -> Self {
        Self::new()
    }
}

impl RebuildParams {
    pub fn new() -> Self {
        Self(RebuildValidParams {
            apply_mean_filter: true,
            mean_low_cutoff: 0.5,
            mean_high_cutoff: 1.0,
            apply_component_filter: false,
            component_high_cutoff: 1.0,
            apply_masked_mean: false,
            filter_method: FilterMethod::HighPass,
            fps: 7.5,
            include_noise: true,
        })
    }

    /// Whether to filter the mean time course before adding it back
    pub fn apply_mean_filter(mut self, apply_mean_filter: bool) -> Self {
        self.0.apply_mean_filter = apply_mean_filter;
        self
    }

    /// Lower cutoff of the mean filter in Hz
    pub fn mean_low_cutoff(mut self, mean_low_cutoff: f64) -> Self {
        self.0.mean_low_cutoff = mean_low_cutoff;
        self
    }

    /// Upper cutoff of the mean filter in Hz
    pub fn mean_high_cutoff(mut self, mean_high_cutoff: f64) -> Self {
        self.0.mean_high_cutoff = mean_high_cutoff;
        self
    }

    /// Whether to low-pass the kept component time courses
    pub fn apply_component_filter(mut self, apply_component_filter: bool) -> Self {
        self.0.apply_component_filter = apply_component_filter;
        self
    }

    pub fn component_high_cutoff(mut self, component_high_cutoff: f64) -> Self {
        self.0.component_high_cutoff = component_high_cutoff;
        self
    }

    /// Only add the mean back to pixels covered by the mask of a kept component
    pub fn apply_masked_mean(mut self, apply_masked_mean: bool) -> Self {
        self.0.apply_masked_mean = apply_masked_mean;
        self
    }

    pub fn filter_method(mut self, filter_method: FilterMethod) -> Self {
        self.0.filter_method = filter_method;
        self
    }

    /// Frame rate of the movie
    pub fn fps(mut self, fps: f64) -> Self {
        self.0.fps = fps;
        self
    }

    /// Whether noise components take part in the reconstruction
    pub fn include_noise(mut self, include_noise: bool) -> Self {
        self.0.include_noise = include_noise;
        self
    }
}

impl ParamGuard for RebuildParams {
    type Checked = RebuildValidParams;
    type Error = SeasError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SeasError::InvalidValue(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };
        positive("mean_low_cutoff", self.0.mean_low_cutoff)?;
        positive("mean_high_cutoff", self.0.mean_high_cutoff)?;
        positive("component_high_cutoff", self.0.component_high_cutoff)?;
        positive("fps", self.0.fps)?;

        if self.0.filter_method == FilterMethod::BandPass
            && self.0.mean_low_cutoff >= self.0.mean_high_cutoff
        {
            return Err(SeasError::InvalidValue(format!(
                "band-pass needs mean_low_cutoff below mean_high_cutoff, got {} and {}",
                self.0.mean_low_cutoff, self.0.mean_high_cutoff
            )));
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<RebuildParams>();
        has_autotraits::<RebuildValidParams>();
        has_autotraits::<FilterMethod>();
    }

    #[test]
    fn filter_names() {
        assert_eq!("butterworth".parse::<FilterMethod>(), Ok(FilterMethod::HighPass));
        assert_eq!("highpass".parse::<FilterMethod>(), Ok(FilterMethod::HighPass));
        assert_eq!("butterworth_lowpass".parse::<FilterMethod>(), Ok(FilterMethod::LowPass));
        assert_eq!("Bandpass".parse::<FilterMethod>(), Ok(FilterMethod::BandPass));
        assert_eq!("wavelet".parse::<FilterMethod>(), Ok(FilterMethod::Denoise));
        assert_eq!("constant".parse::<FilterMethod>(), Ok(FilterMethod::Constant));
        assert_eq!(
            "median".parse::<FilterMethod>(),
            Err(SeasError::UnsupportedFilter("median".into()))
        );

        for method in [
            FilterMethod::HighPass,
            FilterMethod::LowPass,
            FilterMethod::BandPass,
            FilterMethod::Denoise,
            FilterMethod::Constant,
        ] {
            assert_eq!(method.to_string().parse::<FilterMethod>(), Ok(method));
        }
    }

    #[test]
    fn defaults() {
        let params = RebuildParams::default().check().unwrap();
        assert!(params.apply_mean_filter());
        assert!(!params.apply_component_filter());
        assert!(!params.apply_masked_mean());
        assert!(params.include_noise());
        assert_eq!(params.filter_method(), FilterMethod::HighPass);
        assert_eq!(params.fps(), 7.5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(RebuildParams::new().fps(0.).check().is_err());
        assert!(RebuildParams::new().mean_low_cutoff(f64::NAN).check().is_err());
        assert!(RebuildParams::new()
            .filter_method(FilterMethod::BandPass)
            .mean_low_cutoff(2.)
            .mean_high_cutoff(1.)
            .check()
            .is_err());
        assert!(RebuildParams::new()
            .filter_method(FilterMethod::HighPass)
            .mean_low_cutoff(2.)
            .mean_high_cutoff(1.)
            .check()
            .is_ok());
    }
}
