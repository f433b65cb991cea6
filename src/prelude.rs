//! SEAS prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Result, SeasError};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::{Float, ParamGuard};

#[doc(no_inline)]
pub use crate::decomposition::{
    DecomposeParams, DecomposeValidParams, Decomposition, DecompositionSource, Termination,
};

#[doc(no_inline)]
pub use crate::reconstruction::{
    filter_mean, ComponentSelection, FilterMethod, RebuildParams, RebuildValidParams, TimeWindow,
};

#[doc(no_inline)]
pub use crate::movie::{flatten_movie, unflatten_frames, MovieShape, SpatialMask};

#[doc(no_inline)]
pub use crate::eigenbrain::{eigenbrain, eigenbrains, FrameLayout};

#[doc(no_inline)]
pub use crate::roi::{rebuild_roi_timecourses, RoiOptions};

#[doc(no_inline)]
pub use crate::linearity::approximate_linearity_transition;
