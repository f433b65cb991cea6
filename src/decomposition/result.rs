use ndarray::{Array1, Array2, ArrayView2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Result, SeasError};
use crate::movie::{MovieShape, SpatialMask};
use crate::Float;

/// Why the adaptive component search stopped growing
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The signal fraction dropped below the target
    Quality,
    /// The component count reached its ceiling
    Exhaustion,
}

/// Fields only produced when the component count was chosen adaptively
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSummary<F> {
    /// Singular values of the mean-removed signal matrix
    pub svd_eigval: Array1<F>,
    /// Linearity transition of the spectrum, before the multiplier is applied
    pub transition: usize,
    pub svd_multiplier: f64,
    /// Number of components decomposed before cropping excess noise
    pub svd_cutoff: usize,
    /// Number of times the component count was grown
    pub increased_cutoff: usize,
    /// Lag-1 autocorrelation of the uncropped time courses, in crop order
    pub lag1_full: Array1<F>,
    pub termination: Termination,
    /// Signal fraction of the accepted decomposition, before cropping
    pub signal_fraction: f64,
    /// Component count of every decomposition the search evaluated
    pub component_history: Vec<usize>,
}

/// Fields only produced when the component count was requested explicitly
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSummary {
    /// Components whose sign was inverted so that their dominant pixel is non-negative
    pub flipped: Array1<bool>,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionPath<F> {
    Adaptive(AdaptiveSummary<F>),
    Fixed(FixedSummary),
}

/// Signal lost by the decomposition, with every component retained
///
/// Both the original and the rebuilt matrix have their spatial mean removed frame by frame
/// before differencing, so these residuals are insensitive to a shift of the mean signal.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Residuals<F> {
    /// Mean absolute residual of every pixel, in the frame layout
    pub spatial: Array2<F>,
    /// Mean absolute residual of every frame
    pub temporal: Array1<F>,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub time_elapsed: f64,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
    /// Short `yymmdd` date stamp
    pub date: String,
    pub n_components: usize,
}

/// Result of an ICA decomposition of a signal matrix
///
/// Always holds the mean time course, the spatial factors `eig_vec` `(pixels, n_components)`,
/// the mixing matrix `eig_mix` `(time, n_components)` and the noise labels. The artifact
/// selection and the thresholded component masks are attached afterwards by curation.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<F> {
    pub(crate) mean: Array1<F>,
    pub(crate) shape: MovieShape,
    pub(crate) mask: Option<SpatialMask>,
    pub(crate) eig_vec: Array2<F>,
    pub(crate) eig_mix: Array2<F>,
    pub(crate) noise_components: Array1<bool>,
    pub(crate) cutoff: F,
    pub(crate) lag1: Array1<F>,
    pub(crate) artifact_components: Option<Array1<bool>>,
    pub(crate) component_masks: Option<Array2<bool>>,
    pub(crate) path: DecompositionPath<F>,
    pub(crate) residuals: Option<Residuals<F>>,
    pub(crate) provenance: Provenance,
}

impl<F: Float> Decomposition<F> {
    /// Assemble a decomposition from previously computed parts, checking every invariant
    ///
    /// This is how external storage hands a persisted decomposition back to the pipeline.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        mean: Array1<F>,
        shape: MovieShape,
        mask: Option<SpatialMask>,
        eig_vec: Array2<F>,
        eig_mix: Array2<F>,
        noise_components: Array1<bool>,
        cutoff: F,
        path: DecompositionPath<F>,
        provenance: Provenance,
    ) -> Result<Self> {
        let lag1 = crate::correlation::lag_n_autocorr(&eig_mix.t(), 1);
        let decomposition = Decomposition {
            mean,
            shape,
            mask,
            eig_vec,
            eig_mix,
            noise_components,
            cutoff,
            lag1,
            artifact_components: None,
            component_masks: None,
            path,
            residuals: None,
            provenance,
        };
        decomposition.validate()?;

        Ok(decomposition)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let n = self.eig_vec.ncols();
        if self.eig_mix.ncols() != n {
            return Err(SeasError::shape(
                "mixing matrix columns",
                n,
                self.eig_mix.ncols(),
            ));
        }
        if self.noise_components.len() != n {
            return Err(SeasError::shape(
                "noise labels",
                n,
                self.noise_components.len(),
            ));
        }
        if self.eig_mix.nrows() != self.mean.len() {
            return Err(SeasError::shape(
                "mean time course",
                self.eig_mix.nrows(),
                self.mean.len(),
            ));
        }
        crate::movie::check_mask(&self.shape, self.mask.as_ref())?;

        Ok(())
    }

    /// Mean time course removed before decomposition, one value per frame
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    pub fn shape(&self) -> MovieShape {
        self.shape
    }

    pub fn mask(&self) -> Option<&SpatialMask> {
        self.mask.as_ref()
    }

    /// Spatial factors `(pixels, n_components)`
    pub fn eig_vec(&self) -> &Array2<F> {
        &self.eig_vec
    }

    /// Temporal factors `(time, n_components)`
    pub fn eig_mix(&self) -> &Array2<F> {
        &self.eig_mix
    }

    /// Component time courses `(n_components, time)`
    pub fn timecourses(&self) -> ArrayView2<'_, F> {
        self.eig_mix.t()
    }

    pub fn n_components(&self) -> usize {
        self.eig_vec.ncols()
    }

    pub fn noise_components(&self) -> &Array1<bool> {
        &self.noise_components
    }

    pub fn cutoff(&self) -> F {
        self.cutoff
    }

    /// Lag-1 autocorrelation of every component time course
    pub fn lag1(&self) -> &Array1<F> {
        &self.lag1
    }

    pub fn artifact_components(&self) -> Option<&Array1<bool>> {
        self.artifact_components.as_ref()
    }

    /// Attach the curated artifact selection, one flag per component
    pub fn set_artifact_components(&mut self, artifacts: Array1<bool>) -> Result<()> {
        if artifacts.len() != self.n_components() {
            return Err(SeasError::shape(
                "artifact components",
                self.n_components(),
                artifacts.len(),
            ));
        }
        self.artifact_components = Some(artifacts);

        Ok(())
    }

    pub fn component_masks(&self) -> Option<&Array2<bool>> {
        self.component_masks.as_ref()
    }

    /// Attach thresholded spatial masks, `(pixels, n_components)`
    pub fn set_component_masks(&mut self, masks: Array2<bool>) -> Result<()> {
        if masks.dim() != self.eig_vec.dim() {
            return Err(SeasError::shape(
                "component masks",
                format!("{:?}", self.eig_vec.dim()),
                format!("{:?}", masks.dim()),
            ));
        }
        self.component_masks = Some(masks);

        Ok(())
    }

    pub fn path(&self) -> &DecompositionPath<F> {
        &self.path
    }

    pub fn adaptive(&self) -> Option<&AdaptiveSummary<F>> {
        match &self.path {
            DecompositionPath::Adaptive(summary) => Some(summary),
            DecompositionPath::Fixed(_) => None,
        }
    }

    pub fn flipped(&self) -> Option<&Array1<bool>> {
        match &self.path {
            DecompositionPath::Fixed(summary) => Some(&summary.flipped),
            DecompositionPath::Adaptive(_) => None,
        }
    }

    pub fn residuals(&self) -> Option<&Residuals<F>> {
        self.residuals.as_ref()
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

/// Anything that can hand over a decomposition, such as an external storage handle
pub trait DecompositionSource<F: Float> {
    fn load(&self) -> Result<std::borrow::Cow<'_, Decomposition<F>>>;
}

impl<F: Float> DecompositionSource<F> for Decomposition<F> {
    fn load(&self) -> Result<std::borrow::Cow<'_, Decomposition<F>>> {
        Ok(std::borrow::Cow::Borrowed(self))
    }
}
