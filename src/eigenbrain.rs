//! Spatial factors in the frame layout
use ndarray::{Array2, Array3, ArrayBase, Data, Ix2};

use crate::decomposition::Decomposition;
use crate::error::{Result, SeasError};
use crate::movie::{scatter_to_frame, MovieShape, SpatialMask};
use crate::Float;

/// Where the rows of the spatial factors go in a frame
#[derive(Debug, Clone, Copy)]
pub enum FrameLayout<'a> {
    /// Rows are the active pixels of the mask
    Masked(&'a SpatialMask),
    /// Rows are every pixel of a `(height, width)` frame
    Full(usize, usize),
}

impl<'a> FrameLayout<'a> {
    fn shape(&self) -> MovieShape {
        let (height, width) = match self {
            FrameLayout::Masked(mask) => mask.dim(),
            FrameLayout::Full(height, width) => (*height, *width),
        };
        MovieShape::new(1, height, width)
    }

    fn mask(&self) -> Option<&'a SpatialMask> {
        match self {
            FrameLayout::Masked(mask) => Some(mask),
            FrameLayout::Full(..) => None,
        }
    }
}

/// Reshape the spatial factor of one component into a `(height, width)` map
///
/// Pixels outside the mask are NaN.
pub fn eigenbrain<F, D>(
    eig_vec: &ArrayBase<D, Ix2>,
    index: usize,
    layout: FrameLayout<'_>,
) -> Result<Array2<F>>
where
    F: Float,
    D: Data<Elem = F>,
{
    if index >= eig_vec.ncols() {
        return Err(SeasError::InvalidValue(format!(
            "component {} requested from {} components",
            index,
            eig_vec.ncols()
        )));
    }

    scatter_to_frame(&eig_vec.column(index), layout.shape(), layout.mask(), F::nan())
}

/// Reshape every spatial factor into a stack of `(n_components, height, width)` maps
pub fn eigenbrains<F, D>(eig_vec: &ArrayBase<D, Ix2>, layout: FrameLayout<'_>) -> Result<Array3<F>>
where
    F: Float,
    D: Data<Elem = F>,
{
    let shape = layout.shape();
    let mut stack = Array3::from_elem((eig_vec.ncols(), shape.height, shape.width), F::nan());
    for (column, mut frame) in eig_vec.columns().into_iter().zip(stack.outer_iter_mut()) {
        frame.assign(&scatter_to_frame(&column, shape, layout.mask(), F::nan())?);
    }

    Ok(stack)
}

impl<F: Float> Decomposition<F> {
    fn layout(&self) -> FrameLayout<'_> {
        match self.mask() {
            Some(mask) => FrameLayout::Masked(mask),
            None => FrameLayout::Full(self.shape().height, self.shape().width),
        }
    }

    /// Spatial factor of one component in the movie frame
    pub fn eigenbrain(&self, index: usize) -> Result<Array2<F>> {
        eigenbrain(self.eig_vec(), index, self.layout())
    }

    /// Spatial factors of every component in the movie frame
    pub fn eigenbrains(&self) -> Result<Array3<F>> {
        eigenbrains(self.eig_vec(), self.layout())
    }
}
