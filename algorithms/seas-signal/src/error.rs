use seas::error::SeasError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignalError>;

/// An error when designing or applying a filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// Cutoffs must lie strictly between zero and the Nyquist frequency
    #[error("cutoff {cutoff} Hz outside of (0, {nyquist}) Hz")]
    InvalidCutoff { cutoff: f64, nyquist: f64 },
    #[error("filter order must be at least one")]
    InvalidOrder,
    #[error("band-pass needs low < high, got {low} Hz and {high} Hz")]
    InvalidBand { low: f64, high: f64 },
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
}

impl From<SignalError> for SeasError {
    fn from(err: SignalError) -> Self {
        SeasError::InvalidValue(err.to_string())
    }
}
