//! # Default solvers for SEAS
//!
//! `seas-ica` provides pure Rust implementations of the numerical solvers a SEAS decomposition
//! is built on:
//!
//! - Fast Independent Component Analysis (Fast ICA), implementing [`seas::traits::IcaSolver`]
//! - a thin singular value decomposition, implementing [`seas::traits::SvdSolver`]
//!
//! ICA separates mutivariate signals into their additive, independent subcomponents. Input data
//! is whitened (remove underlying correlation) before modeling. The solver reports any
//! non-finite intermediate value as an overflow, which lets the decomposition retry a single
//! precision matrix at double precision.
//!
//! ```rust,ignore
//! use seas::prelude::*;
//! use seas_ica::{svd::ThinSvd, FastIcaParams};
//!
//! let ica = FastIcaParams::new().random_state(1000).check()?;
//! let toolkit = Toolkit::new(ThinSvd, ica, classifier);
//! ```

#[macro_use]
extern crate ndarray;

pub mod error;
pub mod fast_ica;
mod hyperparams;
pub mod svd;

pub use fast_ica::{FastIca, GFunc};
pub use hyperparams::*;
