//! Wavelet shrinkage denoising
//!
//! The signal is split by a multilevel Haar transform. Detail level `j` describes structure
//! with a period of about `2^j / fps` seconds; the levels shorter than the upper period are
//! soft-thresholded at the universal threshold `σ √(2 ln n)`, with `σ` estimated from the
//! median absolute finest detail. Coarser structure is kept as is.
use log::debug;
use ndarray::{Array1, ArrayView1};
use seas::Float;

use crate::error::{Result, SignalError};

const MAD_SCALE: f64 = 0.6745;

fn haar_step(approx: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let half = (approx.len() + 1) / 2;
    let (mut coarse, mut detail) = (Vec::with_capacity(half), Vec::with_capacity(half));
    for pair in approx.chunks(2) {
        // odd lengths repeat their last sample
        let (a, b) = (pair[0], *pair.get(1).unwrap_or(&pair[0]));
        coarse.push((a + b) / std::f64::consts::SQRT_2);
        detail.push((a - b) / std::f64::consts::SQRT_2);
    }

    (coarse, detail)
}

fn haar_inverse(coarse: &[f64], detail: &[f64], len: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(2 * coarse.len());
    for (&c, &d) in coarse.iter().zip(detail) {
        out.push((c + d) / std::f64::consts::SQRT_2);
        out.push((c - d) / std::f64::consts::SQRT_2);
    }
    out.truncate(len);

    out
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    match n {
        0 => 0.,
        _ if n % 2 == 1 => values[n / 2],
        _ => (values[n / 2 - 1] + values[n / 2]) / 2.,
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    value.signum() * (value.abs() - threshold).max(0.)
}

/// Number of detail levels with a period below `upper_period` that fit in `len` samples
pub fn noise_levels(len: usize, fps: f64, upper_period: f64) -> usize {
    let mut levels = 0;
    let mut size = len;
    while size >= 2 && 2f64.powi(levels as i32 + 1) / fps < upper_period {
        levels += 1;
        size = (size + 1) / 2;
    }

    levels
}

/// Denoise `signal`, keeping structure with periods above `upper_period` seconds
pub fn denoise<F: Float>(signal: ArrayView1<F>, fps: f64, upper_period: f64) -> Result<Array1<F>> {
    if !(fps > 0. && fps.is_finite()) {
        return Err(SignalError::InvalidValue(format!(
            "frame rate must be positive, got {}",
            fps
        )));
    }
    if upper_period.is_nan() || upper_period <= 0. {
        return Err(SignalError::InvalidValue(format!(
            "upper period must be positive, got {}",
            upper_period
        )));
    }

    let x: Vec<f64> = signal.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect();
    let levels = noise_levels(x.len(), fps, upper_period);
    if levels == 0 {
        return Ok(signal.to_owned());
    }

    let mut lengths = Vec::with_capacity(levels);
    let mut details = Vec::with_capacity(levels);
    let mut approx = x;
    for _ in 0..levels {
        lengths.push(approx.len());
        let (coarse, detail) = haar_step(&approx);
        details.push(detail);
        approx = coarse;
    }

    let mut finest: Vec<f64> = details[0].iter().map(|d| d.abs()).collect();
    let sigma = median(&mut finest) / MAD_SCALE;
    let threshold = sigma * (2. * (signal.len() as f64).ln()).sqrt();
    debug!(
        "wavelet denoising {} levels at threshold {:.4}",
        levels, threshold
    );

    for (detail, len) in details.iter_mut().zip(lengths).rev() {
        detail
            .iter_mut()
            .for_each(|d| *d = soft_threshold(*d, threshold));
        approx = haar_inverse(&approx, detail, len);
    }

    Ok(approx.into_iter().map(F::cast).collect())
}
