//! Linearity transition of an eigenvalue spectrum
//!
//! The cumulative energy of a descending spectrum is concave while signal dominates and turns
//! linear once only the noise floor remains. The first index at which the cumulative curve rises
//! above a quadratic fit of itself approximates that transition, and seeds the number of
//! independent components to extract.
use linfa_linalg::qr::LeastSquaresQrInto;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1};

use crate::error::{Result, SeasError};
use crate::Float;

/// Margin the cumulative curve must clear above its fit, on the unit-normalised scale
const CROSSING_TOLERANCE: f64 = 1e-9;

/// Estimate the index at which the spectrum transitions into its linear noise floor
///
/// # Errors
///
/// [`SeasError::Estimation`] when the spectrum has fewer than three values, is constant, holds
/// non-finite values, or when the cumulative curve never rises above its quadratic fit.
pub fn approximate_linearity_transition<F: Float, D: Data<Elem = F>>(
    eig_val: &ArrayBase<D, Ix1>,
) -> Result<usize> {
    let n = eig_val.len();
    if n < 3 {
        return Err(SeasError::Estimation(format!(
            "a quadratic fit needs at least 3 eigenvalues, got {}",
            n
        )));
    }

    let values = eig_val.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SeasError::Estimation(
            "eigenvalue spectrum contains non-finite values".into(),
        ));
    }

    let min = values.fold(f64::INFINITY, |m, &v| m.min(v));
    let shifted = values.mapv(|v| v - min);
    let total = shifted.sum();
    if total <= 0.0 {
        return Err(SeasError::Estimation(
            "eigenvalue spectrum is constant".into(),
        ));
    }

    let mut running = 0.0;
    let integrated: Array1<f64> = shifted
        .iter()
        .map(|v| {
            running += v / total;
            running
        })
        .collect();

    // component index rescaled to [0, 1]
    let x = Array1::from_shape_fn(n, |i| i as f64 / (n - 1) as f64);
    let coeffs = quadratic_fit(&x, &integrated)?;

    integrated
        .iter()
        .zip(x.iter())
        .position(|(&y, &x)| y > coeffs[0] + coeffs[1] * x + coeffs[2] * x * x + CROSSING_TOLERANCE)
        .ok_or_else(|| {
            SeasError::Estimation(
                "integrated spectrum never crosses above its quadratic fit".into(),
            )
        })
}

/// Least squares coefficients `[c0, c1, c2]` of `y ≈ c0 + c1 x + c2 x²`
fn quadratic_fit(x: &Array1<f64>, y: &Array1<f64>) -> Result<[f64; 3]> {
    let vandermonde = Array2::from_shape_fn((x.len(), 3), |(i, k)| x[i].powi(k as i32));

    let coeffs = vandermonde
        .least_squares_into(y.to_owned().insert_axis(Axis(1)))
        .map_err(|e| SeasError::Estimation(format!("quadratic fit failed: {}", e)))?;

    Ok([coeffs[[0, 0]], coeffs[[1, 0]], coeffs[[2, 0]]])
}
