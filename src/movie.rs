//! Movie geometry and spatial mask indexing
//!
//! A movie of shape `(time, height, width)` is handled as a signal matrix with one row per
//! pixel and one column per frame. When a [`SpatialMask`] is used, only the rows of the active
//! pixels are kept, in the row-major order of the mask.
use ndarray::{Array1, Array2, Array3, ArrayBase, ArrayView2, ArrayView3, Axis, Data, Ix1};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Result, SeasError};
use crate::Float;

/// Original `(time, height, width)` dimensions of a movie
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovieShape {
    pub time: usize,
    pub height: usize,
    pub width: usize,
}

impl MovieShape {
    pub fn new(time: usize, height: usize, width: usize) -> Self {
        MovieShape {
            time,
            height,
            width,
        }
    }

    /// Number of pixels in one frame
    pub fn n_pixels(&self) -> usize {
        self.height * self.width
    }

    pub fn frame(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Same frame geometry with a different number of frames
    pub fn with_time(&self, time: usize) -> Self {
        MovieShape { time, ..*self }
    }
}

impl From<(usize, usize, usize)> for MovieShape {
    fn from((time, height, width): (usize, usize, usize)) -> Self {
        MovieShape::new(time, height, width)
    }
}

impl std::fmt::Display for MovieShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.time, self.height, self.width)
    }
}

/// Boolean region of interest over the frame
///
/// The positions of the active pixels in the row-major flattening of the frame are computed
/// once on construction.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMask {
    mask: Array2<bool>,
    active: Vec<usize>,
}

impl SpatialMask {
    pub fn new(mask: Array2<bool>) -> Self {
        let active = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| if on { Some(i) } else { None })
            .collect();

        SpatialMask { mask, active }
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn dim(&self) -> (usize, usize) {
        self.mask.dim()
    }

    /// Flat row-major indices of the active pixels
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    pub fn n_active(&self) -> usize {
        self.active.len()
    }

    /// Keep only the rows of a full-frame signal matrix which fall inside the mask
    pub fn crop_rows<F: Float>(&self, matrix: ArrayView2<F>) -> Result<Array2<F>> {
        if matrix.nrows() != self.mask.len() {
            return Err(SeasError::shape(
                "mask crop",
                format!("{} rows (mask size)", self.mask.len()),
                format!("{} rows", matrix.nrows()),
            ));
        }

        Ok(matrix.select(Axis(0), &self.active))
    }
}

impl From<Array2<bool>> for SpatialMask {
    fn from(mask: Array2<bool>) -> Self {
        SpatialMask::new(mask)
    }
}

/// Number of signal matrix rows expected for this frame geometry
pub(crate) fn expected_rows(shape: &MovieShape, mask: Option<&SpatialMask>) -> usize {
    match mask {
        Some(mask) => mask.n_active(),
        None => shape.n_pixels(),
    }
}

/// Check that the mask covers the frame of the movie
pub(crate) fn check_mask(shape: &MovieShape, mask: Option<&SpatialMask>) -> Result<()> {
    match mask {
        Some(mask) if mask.dim() != shape.frame() => Err(SeasError::shape(
            "mask geometry",
            format!("{:?}", shape.frame()),
            format!("{:?}", mask.dim()),
        )),
        _ => Ok(()),
    }
}

/// Flatten a `(time, height, width)` movie into a `(height * width, time)` signal matrix
pub fn flatten_movie<F: Float>(movie: ArrayView3<F>) -> Result<(Array2<F>, MovieShape)> {
    let shape = MovieShape::from(movie.dim());
    let frames = movie
        .as_standard_layout()
        .into_owned()
        .into_shape((shape.time, shape.n_pixels()))?;

    Ok((frames.reversed_axes().as_standard_layout().into_owned(), shape))
}

/// Fold a `(time, pixels)` matrix back into a `(time, height, width)` movie
///
/// With a mask the columns are scattered to the active pixel positions and every inactive pixel
/// stays zero.
pub fn unflatten_frames<F: Float>(
    frames: Array2<F>,
    shape: MovieShape,
    mask: Option<&SpatialMask>,
) -> Result<Array3<F>> {
    let n_frames = frames.nrows();
    let expected = expected_rows(&shape, mask);
    if frames.ncols() != expected {
        return Err(SeasError::shape(
            "frame unflatten",
            format!("{} pixels per frame", expected),
            format!("{} pixels per frame", frames.ncols()),
        ));
    }

    let frames = match mask {
        None => frames,
        Some(mask) => {
            let mut full = Array2::zeros((n_frames, shape.n_pixels()));
            for (col, &idx) in mask.active_indices().iter().enumerate() {
                full.column_mut(idx).assign(&frames.column(col));
            }
            full
        }
    };

    Ok(frames
        .as_standard_layout()
        .into_owned()
        .into_shape((n_frames, shape.height, shape.width))?)
}

/// Place one value per signal matrix row into the frame layout, filling pixels outside the mask
pub fn scatter_to_frame<F: Float, D: Data<Elem = F>>(
    values: &ArrayBase<D, Ix1>,
    shape: MovieShape,
    mask: Option<&SpatialMask>,
    fill: F,
) -> Result<Array2<F>> {
    let expected = expected_rows(&shape, mask);
    if values.len() != expected {
        return Err(SeasError::shape(
            "frame scatter",
            format!("{} values", expected),
            format!("{} values", values.len()),
        ));
    }

    let flat: Array1<F> = match mask {
        None => values.to_owned(),
        Some(mask) => {
            let mut flat = Array1::from_elem(shape.n_pixels(), fill);
            for (&idx, &v) in mask.active_indices().iter().zip(values.iter()) {
                flat[idx] = v;
            }
            flat
        }
    };

    Ok(flat.into_shape(shape.frame())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<MovieShape>();
        has_autotraits::<SpatialMask>();
    }

    #[test]
    fn mask_indices_are_row_major() {
        let mask = SpatialMask::new(array![[true, false, true], [false, true, false]]);
        assert_eq!(mask.active_indices(), &[0, 2, 4]);
        assert_eq!(mask.n_active(), 3);
    }

    #[test]
    fn flatten_then_unflatten_restores_movie() {
        let movie = Array::range(0., 24., 1.).into_shape((4, 2, 3)).unwrap();
        let (matrix, shape) = flatten_movie(movie.view()).unwrap();

        assert_eq!(matrix.dim(), (6, 4));
        assert_eq!(shape, MovieShape::new(4, 2, 3));
        // pixel (0, 1) of frame 2
        assert_abs_diff_eq!(matrix[[1, 2]], movie[[2, 0, 1]]);

        let restored = unflatten_frames(matrix.reversed_axes(), shape, None).unwrap();
        assert_abs_diff_eq!(restored, movie);
    }

    #[test]
    fn unflatten_with_mask_zeroes_inactive_pixels() {
        let mask = SpatialMask::new(array![[true, false], [false, true]]);
        let frames = array![[1., 2.], [3., 4.]];
        let movie = unflatten_frames(frames, MovieShape::new(2, 2, 2), Some(&mask)).unwrap();

        assert_abs_diff_eq!(movie, array![[[1., 0.], [0., 2.]], [[3., 0.], [0., 4.]]]);
    }

    #[test]
    fn crop_rejects_wrong_row_count() {
        let mask = SpatialMask::new(Array2::from_elem((2, 2), true));
        let matrix = Array2::<f64>::zeros((5, 3));
        assert!(matches!(
            mask.crop_rows(matrix.view()),
            Err(SeasError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn scatter_fills_outside_mask() {
        let mask = SpatialMask::new(array![[false, true], [true, false]]);
        let frame =
            scatter_to_frame(&array![5., 7.], MovieShape::new(1, 2, 2), Some(&mask), -1.).unwrap();
        assert_abs_diff_eq!(frame, array![[-1., 5.], [7., -1.]]);
    }
}
