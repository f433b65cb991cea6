use log::debug;
use ndarray::{Array1, ArrayView1};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use seas::error::Result;
use seas::traits::{Band, TimecourseFilter};
use seas::Float;

use crate::{butterworth, wavelet};

/// Time course filter backed by zero-phase Butterworth sections and Haar wavelet shrinkage
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFilter {
    order: usize,
}

impl Default for SignalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalFilter {
    /// Fifth order Butterworth filters
    pub fn new() -> Self {
        SignalFilter { order: 5 }
    }

    /// Set the order of the Butterworth filters
    pub fn order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }
}

impl<F: Float> TimecourseFilter<F> for SignalFilter {
    fn butterworth(&self, signal: ArrayView1<F>, band: Band, fps: f64) -> Result<Array1<F>> {
        let sections = butterworth::sections(self.order, band, fps)?;
        debug!(
            "{:?} Butterworth filter of order {} at {} fps",
            band, self.order, fps
        );

        Ok(butterworth::filtfilt(&sections, signal))
    }

    fn denoise(&self, signal: ArrayView1<F>, fps: f64, upper_period: f64) -> Result<Array1<F>> {
        Ok(wavelet::denoise(signal, fps, upper_period)?)
    }
}
