//! Thin singular value decomposition of the signal matrix
use linfa_linalg::svd::*;
use log::debug;
use ndarray::{Array1, Array2, ArrayView2};
use seas::traits::SvdSolver;
use seas::Float;

use crate::error::FastIcaError;

/// Left singular vectors and singular values, sorted by decreasing singular value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinSvd;

impl<F: Float> SvdSolver<F> for ThinSvd {
    fn left_singular(&self, x: ArrayView2<F>) -> seas::error::Result<(Array2<F>, Array1<F>)> {
        let k = x.nrows().min(x.ncols());
        if k == 0 {
            return Err(FastIcaError::NotEnoughSamples.into());
        }

        let (u, s, _) = x
            .svd(true, false)
            .map_err(FastIcaError::from)?
            .sort_svd_desc();
        let u = u.ok_or(FastIcaError::SvdDecomposition)?;
        debug!("thin SVD of {}x{} matrix", x.nrows(), x.ncols());

        Ok((u.slice_move(s![.., ..k]), s.slice_move(s![..k])))
    }
}
