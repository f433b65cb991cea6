//! Movie reconstruction from a subset of the components
//!
//! The kept spatial and temporal factors are multiplied back into frames, the mean time course
//! is added back after an optional filtering pass and the frames are folded into the movie
//! geometry, scattering through the mask when there is one.
mod algorithm;
mod hyperparams;
mod mean_filter;

pub use algorithm::*;
pub use hyperparams::*;
pub use mean_filter::*;
