//! # Signal processing for SEAS
//!
//! `seas-signal` provides the time course collaborators of a SEAS decomposition:
//!
//! - [`SignalFilter`]: zero-phase Butterworth high-, low- and band-pass filtering and wavelet
//!   shrinkage denoising, implementing [`seas::traits::TimecourseFilter`]
//! - [`NoiseSorter`]: classification of components as noise from the distribution of their
//!   lag-1 autocorrelation, implementing [`seas::traits::NoiseClassifier`]
//!
//! The filter design and application functions are public in [`butterworth`] and [`wavelet`]
//! for callers working on single signals.

#[macro_use]
extern crate ndarray;

pub mod butterworth;
pub mod error;
mod filter;
mod noise;
pub mod wavelet;

pub use filter::SignalFilter;
pub use noise::NoiseSorter;
