//! `seas` separates the independent sources of a calcium imaging movie.
//!
//! A `(time, height, width)` movie is flattened into a `(pixels, time)` signal matrix, its mean
//! time course is removed and the remainder is decomposed by independent component analysis
//! into spatial factors and their time courses. Unless the number of components is requested
//! explicitly, it is chosen adaptively from the SVD spectrum of the signal matrix and grown
//! until enough of the extracted components are classified as noise.
//!
//! The decomposition can then be rebuilt into a movie from any subset of its components, with
//! the mean time course filtered before it is added back. This is how curated artifact
//! components are removed from a recording.
//!
//! ## Crate layout
//!
//! The numerical collaborators are injected through the traits of [`traits`]:
//!
//! * `seas-ica` provides FastICA and a thin SVD
//! * `seas-signal` provides Butterworth filtering, wavelet denoising and the lag-1
//!   autocorrelation noise classifier
//!
//! ```rust,ignore
//! use seas::prelude::*;
//!
//! let (matrix, shape) = flatten_movie(movie.view())?;
//! let decomposition = DecomposeParams::new().decompose(matrix.view(), shape, None, &toolkit)?;
//!
//! let filtered = RebuildParams::new()
//!     .include_noise(false)
//!     .rebuild(&decomposition, &ComponentSelection::IncludeAll, TimeWindow::full(), &filter)?;
//! ```

#[macro_use]
extern crate ndarray;

pub mod correlation;
pub mod decomposition;
pub mod eigenbrain;
pub mod error;
mod float;
pub mod linearity;
pub mod movie;
mod param_guard;
pub mod prelude;
pub mod reconstruction;
pub mod roi;
pub mod traits;

#[cfg(test)]
mod testing;

pub use float::Float;
pub use param_guard::ParamGuard;
