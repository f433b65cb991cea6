//! Adaptive ICA decomposition of a signal matrix
//!
//! A `(pixels, time)` signal matrix has its mean time course removed and is decomposed into
//! spatial factors `eig_vec` and temporal factors `eig_mix`. The number of components is either
//! requested explicitly, or grown from the linearity transition of the SVD spectrum until enough
//! of the components are classified as noise.
//!
//! ```rust,ignore
//! use seas::prelude::*;
//!
//! let decomposition = DecomposeParams::new()
//!     .svd_multiplier(5.0)
//!     .decompose(matrix.view(), shape, Some(&mask), &toolkit)?;
//! ```
mod algorithm;
mod hyperparams;
mod normalize;
mod residuals;
mod result;
mod search;

pub use hyperparams::*;
pub use result::*;
