//! Floating point bound shared by every matrix in the pipeline
use ndarray::NdFloat;
use num_traits::{FromPrimitive, NumCast, Signed};

use std::iter::Sum;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. Signal matrices, component factors and
/// reconstructed movies are all stored with this element type.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Signed
    + Default
    + Sum
    + approx::AbsDiffEq<Epsilon = Self>
{
    /// Human readable name of the precision, reported on solver overflow
    const PRECISION: &'static str;

    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }

    /// Whether this is already the widest supported precision
    fn is_double() -> bool {
        std::mem::size_of::<Self>() >= std::mem::size_of::<f64>()
    }
}

impl Float for f32 {
    const PRECISION: &'static str = "f32";
}

impl Float for f64 {
    const PRECISION: &'static str = "f64";
}
