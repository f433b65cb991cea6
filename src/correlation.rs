//! Autocorrelation analysis for component time courses
//!
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix2};

use crate::Float;

fn pearson_correlation<F: Float>(a: ArrayView1<F>, b: ArrayView1<F>) -> F {
    let n = F::cast(a.len());
    let mean_a = a.sum() / n;
    let mean_b = b.sum() / n;

    let (mut cov, mut var_a, mut var_b) = (F::zero(), F::zero(), F::zero());
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > F::zero() {
        cov / denom
    } else {
        F::zero()
    }
}

/// Lag-`lag` autocorrelation of every row of a `(n_components, time)` matrix
///
/// Rows which are too short for the lag, or which are constant, have no temporal structure and
/// report zero.
pub fn lag_n_autocorr<F: Float, D: Data<Elem = F>>(
    timecourses: &ArrayBase<D, Ix2>,
    lag: usize,
) -> Array1<F> {
    let len = timecourses.ncols();

    timecourses
        .rows()
        .into_iter()
        .map(|row| {
            if len < lag + 2 {
                return F::zero();
            }
            pearson_correlation(
                row.slice(s![..len - lag]),
                row.slice(s![lag..]),
            )
        })
        .collect()
}
