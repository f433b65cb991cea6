use log::debug;
use ndarray::{ArrayView2, Axis};

use super::result::{Decomposition, Residuals};
use crate::error::{Result, SeasError};
use crate::movie::scatter_to_frame;
use crate::Float;

/// Summarise the difference between the mean-removed signal matrix and its full rebuild
pub(crate) fn compute_residuals<F: Float>(
    centered: ArrayView2<F>,
    decomposition: &Decomposition<F>,
) -> Result<Residuals<F>> {
    let rebuilt = decomposition.eig_vec().dot(&decomposition.eig_mix().t());
    if rebuilt.dim() != centered.dim() {
        return Err(SeasError::shape(
            "residuals",
            format!("{:?}", centered.dim()),
            format!("{:?}", rebuilt.dim()),
        ));
    }

    if rebuilt.iter().any(|v| !v.is_finite()) {
        return Err(SeasError::InvalidValue(
            "rebuilt signal matrix holds non-finite values".into(),
        ));
    }

    let no_pixels = || SeasError::InvalidValue("residuals of an empty signal matrix".into());
    let frame_mean = centered.mean_axis(Axis(0)).ok_or_else(no_pixels)?;
    let rebuilt_mean = rebuilt.mean_axis(Axis(0)).ok_or_else(no_pixels)?;

    let diff = ((&centered - &frame_mean) - (rebuilt - &rebuilt_mean)).mapv(|v| v.abs());

    let temporal = diff.mean_axis(Axis(0)).ok_or_else(no_pixels)?;
    let per_pixel = diff
        .mean_axis(Axis(1))
        .ok_or_else(|| SeasError::InvalidValue("residuals of an empty movie".into()))?;
    let spatial = scatter_to_frame(
        &per_pixel,
        decomposition.shape(),
        decomposition.mask(),
        F::zero(),
    )?;
    debug!(
        "mean absolute residual: {:.4}",
        temporal.mean().unwrap_or_else(F::zero)
    );

    Ok(Residuals { spatial, temporal })
}
