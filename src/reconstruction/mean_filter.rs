use log::{debug, info};
use ndarray::{Array1, ArrayBase, Data, Ix1};

use super::hyperparams::FilterMethod;
use crate::error::{Result, SeasError};
use crate::traits::{Band, TimecourseFilter};
use crate::Float;

/// Mean time course after filtering
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMean<F> {
    pub signal: Array1<F>,
    /// Variance of the filtered signal over the variance of the original one, one for a flat
    /// original
    pub variance_retained: F,
}

/// Apply a filtering policy to the mean time course
///
/// The high-pass keeps structure above `low_cutoff`, the low-pass keeps structure below
/// `high_cutoff` and the band-pass keeps the band between them. Denoising keeps periods above
/// `1 / low_cutoff` seconds.
pub fn filter_mean<F, D, T>(
    mean: &ArrayBase<D, Ix1>,
    method: FilterMethod,
    low_cutoff: f64,
    high_cutoff: f64,
    fps: f64,
    filter: &T,
) -> Result<FilteredMean<F>>
where
    F: Float,
    D: Data<Elem = F>,
    T: TimecourseFilter<F>,
{
    info!("filter method: {}", method);
    let signal = match method {
        FilterMethod::HighPass => {
            debug!("high-pass filter of the mean at {} Hz", low_cutoff);
            filter.butterworth(mean.view(), Band::HighPass(low_cutoff), fps)?
        }
        FilterMethod::LowPass => {
            debug!("low-pass filter of the mean at {} Hz", high_cutoff);
            filter.butterworth(mean.view(), Band::LowPass(high_cutoff), fps)?
        }
        FilterMethod::BandPass => {
            debug!(
                "band-pass filter of the mean from {} Hz to {} Hz",
                low_cutoff, high_cutoff
            );
            filter.butterworth(mean.view(), Band::BandPass(low_cutoff, high_cutoff), fps)?
        }
        FilterMethod::Denoise => filter.denoise(mean.view(), fps, low_cutoff.recip())?,
        FilterMethod::Constant => {
            let average = mean.mean().unwrap_or_else(F::zero);
            debug!("mean set as constant: {}", average);
            Array1::from_elem(mean.len(), average)
        }
    };

    if signal.len() != mean.len() {
        return Err(SeasError::shape("filtered mean", mean.len(), signal.len()));
    }

    let variance_retained = variance_ratio(mean, &signal);
    info!(
        "{:.0}% variance retained",
        variance_retained.to_f64().unwrap_or(f64::NAN) * 100.
    );

    Ok(FilteredMean {
        signal,
        variance_retained,
    })
}

fn variance_ratio<F: Float, D: Data<Elem = F>>(original: &ArrayBase<D, Ix1>, filtered: &Array1<F>) -> F {
    if original.is_empty() {
        return F::one();
    }
    let before = original.var(F::zero());
    if before <= F::zero() {
        return F::one();
    }

    filtered.var(F::zero()) / before
}
