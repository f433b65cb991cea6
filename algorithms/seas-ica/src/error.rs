use linfa_linalg::LinalgError;
use seas::error::SeasError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FastIcaError>;

/// An error when running the FastICA algorithm
#[derive(Error, Debug)]
pub enum FastIcaError {
    /// When there are no samples in the provided matrix
    #[error("input must contain at least one sample")]
    NotEnoughSamples,
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
    /// If the SVD did not produce the requested singular vectors
    #[error("SVD Decomposition failed, X could be an Ill-Conditioned matrix")]
    SvdDecomposition,
    #[error("tolerance should be positive but is {0}")]
    InvalidTolerance(f32),
    /// A non-finite value showed up during whitening or optimisation
    #[error("non-finite values encountered at {0} precision")]
    Overflow(&'static str),
    /// Errors encountered during linear algebra operations
    #[error("Linalg Error: {0}")]
    Linalg(#[from] LinalgError),
}

impl From<FastIcaError> for SeasError {
    fn from(err: FastIcaError) -> Self {
        match err {
            FastIcaError::Overflow(precision) => SeasError::SolverOverflow { precision },
            FastIcaError::InvalidValue(msg) => SeasError::InvalidValue(msg),
            other => SeasError::Solver(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_becomes_solver_overflow() {
        let err: SeasError = FastIcaError::Overflow("f32").into();
        assert_eq!(err, SeasError::SolverOverflow { precision: "f32" });

        let err: SeasError = FastIcaError::NotEnoughSamples.into();
        assert!(matches!(err, SeasError::Solver(_)));
    }
}
