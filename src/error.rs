//! Error types in SEAS
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, SeasError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeasError {
    /// A dimensional invariant between the signal matrix, the mask, the movie shape or the
    /// component factors does not hold
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },
    /// The decomposition lacks a field the requested operation needs
    #[error("decomposition is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("filter method '{0}' not supported (expected one of: highpass, lowpass, bandpass, denoise, constant)")]
    UnsupportedFilter(String),
    /// The linearity transition of an eigenvalue spectrum could not be located
    #[error("could not estimate linearity transition: {0}")]
    Estimation(String),
    /// The ICA solver overflowed at the given floating point precision
    #[error("ICA solver overflowed at {precision} precision")]
    SolverOverflow { precision: &'static str },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Any other failure reported by an injected solver
    #[error("solver failed: {0}")]
    Solver(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
}

impl SeasError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        SeasError::ShapeMismatch {
            context,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
