//! Zero-phase Butterworth filtering
//!
//! Filters are designed as cascades of second order sections by the bilinear transform of the
//! analog prototype, with the cutoff prewarped so that the digital response is exactly
//! `1/√2` at the requested frequency. They are applied forwards and backwards, which squares
//! the magnitude response and cancels the phase shift.
use log::trace;
use ndarray::{Array1, ArrayView1};
use seas::traits::Band;
use seas::Float;

use crate::error::{Result, SignalError};

/// One section `b0 + b1 z⁻¹ + b2 z⁻²` over `1 + a1 z⁻¹ + a2 z⁻²`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Section {
    fn is_first_order(&self) -> bool {
        self.b[2] == 0. && self.a[1] == 0.
    }

    /// Gain at zero frequency
    fn dc_gain(&self) -> f64 {
        let den = 1. + self.a[0] + self.a[1];
        if den == 0. {
            0.
        } else {
            self.b.iter().sum::<f64>() / den
        }
    }

    /// State of the transposed direct form after a long constant input of one
    fn steady_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        [gain - self.b[0], self.b[2] - self.a[1] * gain]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Low,
    High,
}

fn prewarp(cutoff: f64, fps: f64) -> Result<f64> {
    let nyquist = fps / 2.;
    if !(cutoff > 0. && cutoff < nyquist) {
        return Err(SignalError::InvalidCutoff { cutoff, nyquist });
    }

    Ok((std::f64::consts::PI * cutoff / fps).tan())
}

fn design(kind: Kind, order: usize, cutoff: f64, fps: f64) -> Result<Vec<Section>> {
    if order == 0 {
        return Err(SignalError::InvalidOrder);
    }
    let wc = prewarp(cutoff, fps)?;
    let wc2 = wc * wc;

    let mut sections = Vec::with_capacity((order + 1) / 2);
    for k in 0..order / 2 {
        let q = 2. * ((2 * k + 1) as f64 * std::f64::consts::PI / (2 * order) as f64).sin();
        let den = 1. + q * wc + wc2;
        let a = [2. * (wc2 - 1.) / den, (1. - q * wc + wc2) / den];
        let b = match kind {
            Kind::Low => [wc2 / den, 2. * wc2 / den, wc2 / den],
            Kind::High => [1. / den, -2. / den, 1. / den],
        };
        sections.push(Section { b, a });
    }

    if order % 2 == 1 {
        let a = [(wc - 1.) / (wc + 1.), 0.];
        let b = match kind {
            Kind::Low => [wc / (1. + wc), wc / (1. + wc), 0.],
            Kind::High => [1. / (1. + wc), -1. / (1. + wc), 0.],
        };
        sections.push(Section { b, a });
    }

    Ok(sections)
}

/// Sections of a low-pass filter of the given order
pub fn lowpass(order: usize, cutoff: f64, fps: f64) -> Result<Vec<Section>> {
    design(Kind::Low, order, cutoff, fps)
}

/// Sections of a high-pass filter of the given order
pub fn highpass(order: usize, cutoff: f64, fps: f64) -> Result<Vec<Section>> {
    design(Kind::High, order, cutoff, fps)
}

/// Sections of a band-pass filter, a high-pass at `low` followed by a low-pass at `high`
pub fn bandpass(order: usize, low: f64, high: f64, fps: f64) -> Result<Vec<Section>> {
    if low.is_nan() || high.is_nan() || low >= high {
        return Err(SignalError::InvalidBand { low, high });
    }
    let mut sections = highpass(order, low, fps)?;
    sections.extend(lowpass(order, high, fps)?);

    Ok(sections)
}

/// Sections for a frequency band
pub fn sections(order: usize, band: Band, fps: f64) -> Result<Vec<Section>> {
    match band {
        Band::HighPass(low) => highpass(order, low, fps),
        Band::LowPass(high) => lowpass(order, high, fps),
        Band::BandPass(low, high) => bandpass(order, low, high, fps),
    }
}

/// Run the cascade once over `x`, starting from the steady state of its first sample
fn sosfilt(sections: &[Section], x: &[f64]) -> Vec<f64> {
    let mut y = x.to_vec();
    let mut level = x.first().copied().unwrap_or(0.);

    for section in sections {
        let [z1, z2] = section.steady_state();
        let (mut z1, mut z2) = (z1 * level, z2 * level);
        let [b0, b1, b2] = section.b;
        let [a1, a2] = section.a;

        for v in y.iter_mut() {
            let input = *v;
            let out = b0 * input + z1;
            z1 = b1 * input - a1 * out + z2;
            z2 = b2 * input - a2 * out;
            *v = out;
        }
        level *= section.dc_gain();
    }

    y
}

/// Number of samples reflected at each end before filtering
pub fn pad_len(sections: &[Section]) -> usize {
    let first_order = sections.iter().filter(|s| s.is_first_order()).count();
    3 * (2 * sections.len() + 1 - first_order)
}

/// Forward-backward filtering with odd reflection padding
///
/// The padding is shortened for signals which are not longer than it.
pub fn filtfilt<F: Float>(sections: &[Section], signal: ArrayView1<F>) -> Array1<F> {
    let n = signal.len();
    if n == 0 || sections.is_empty() {
        return signal.to_owned();
    }

    let x: Vec<f64> = signal.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect();
    let pad = pad_len(sections).min(n - 1);
    trace!("filtfilt over {} samples, padding {}", n, pad);

    let (first, last) = (x[0], x[n - 1]);
    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2. * first - x[i]));
    ext.extend_from_slice(&x);
    ext.extend((1..=pad).map(|i| 2. * last - x[n - 1 - i]));

    let mut y = sosfilt(sections, &ext);
    y.reverse();
    let mut y = sosfilt(sections, &y);
    y.reverse();

    y[pad..pad + n].iter().map(|&v| F::cast(v)).collect()
}
