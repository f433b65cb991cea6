use std::ops::Range;

use log::{debug, info};
use ndarray::{Array1, Array2, Array3, Axis};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{RebuildParams, RebuildValidParams};
use super::mean_filter::filter_mean;
use crate::decomposition::{Decomposition, DecompositionSource};
use crate::error::{Result, SeasError};
use crate::movie::{expected_rows, unflatten_frames};
use crate::param_guard::ParamGuard;
use crate::traits::{Band, TimecourseFilter};
use crate::Float;

/// Which components are left out of a reconstruction
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSelection {
    /// Leave out the artifact components attached to the decomposition
    Stored,
    /// Leave nothing out
    IncludeAll,
    /// Leave out every component flagged `true`
    Explicit(Array1<bool>),
}

impl ComponentSelection {
    /// Exclusion flags for every component of `decomposition`
    pub fn exclusion<F: Float>(&self, decomposition: &Decomposition<F>) -> Result<Array1<bool>> {
        let n_components = decomposition.n_components();
        match self {
            ComponentSelection::Stored => decomposition
                .artifact_components()
                .cloned()
                .ok_or(SeasError::MissingField("artifact_components")),
            ComponentSelection::IncludeAll => Ok(Array1::from_elem(n_components, false)),
            ComponentSelection::Explicit(excluded) if excluded.len() == n_components => {
                Ok(excluded.clone())
            }
            ComponentSelection::Explicit(excluded) => Err(SeasError::shape(
                "component selection",
                n_components,
                excluded.len(),
            )),
        }
    }
}

impl From<Array1<bool>> for ComponentSelection {
    fn from(excluded: Array1<bool>) -> Self {
        ComponentSelection::Explicit(excluded)
    }
}

/// Frames `[start, stop)` to rebuild, bounds beyond the movie are clamped
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

impl TimeWindow {
    pub fn full() -> Self {
        TimeWindow::default()
    }

    pub fn new(start: Option<usize>, stop: Option<usize>) -> Self {
        TimeWindow { start, stop }
    }

    /// Clamp the window to `n_frames` frames
    pub fn resolve(&self, n_frames: usize) -> Range<usize> {
        let start = self.start.unwrap_or(0).min(n_frames);
        let stop = self.stop.unwrap_or(n_frames).min(n_frames).max(start);

        start..stop
    }
}

impl From<Range<usize>> for TimeWindow {
    fn from(range: Range<usize>) -> Self {
        TimeWindow::new(Some(range.start), Some(range.end))
    }
}

/// Raw, artifact and filtered movies over the same window
#[derive(Debug, Clone, PartialEq)]
pub struct FilterComparison<F> {
    /// Every component
    pub raw: Array3<F>,
    /// Only the components the filtered movie leaves out
    pub artifact: Array3<F>,
    /// The stored artifact selection applied
    pub filtered: Array3<F>,
}

/// Exclusion flags of the artifact movie, the inverse of what a filtered rebuild removes
///
/// With `include_noise` unset the noise components count as removed, so they show up in the
/// artifact movie.
pub fn artifact_selection<F: Float>(
    decomposition: &Decomposition<F>,
    include_noise: bool,
) -> Result<Array1<bool>> {
    let mut removed = ComponentSelection::Stored.exclusion(decomposition)?;
    if !include_noise {
        removed.zip_mut_with(decomposition.noise_components(), |r, &n| *r = *r || n);
    }

    Ok(removed.mapv(|r| !r))
}

impl RebuildValidParams {
    /// Rebuild a `(time, height, width)` movie from the kept components
    ///
    /// Without any kept component the result is all zero. The mean time course is added back
    /// after filtering, to every pixel or with `apply_masked_mean` only to the pixels covered by
    /// a kept component mask.
    ///
    /// # Errors
    ///
    /// [`SeasError::MissingField`] when the selection or the masked mean needs a field the
    /// decomposition lacks, [`SeasError::ShapeMismatch`] when the spatial factors do not match
    /// the movie geometry.
    pub fn rebuild<F, T>(
        &self,
        decomposition: &Decomposition<F>,
        selection: &ComponentSelection,
        window: TimeWindow,
        filter: &T,
    ) -> Result<Array3<F>>
    where
        F: Float,
        T: TimecourseFilter<F>,
    {
        let mut excluded = selection.exclusion(decomposition)?;
        if !self.include_noise() {
            debug!("not rebuilding noise components");
            excluded.zip_mut_with(decomposition.noise_components(), |e, &n| *e = *e || n);
        }
        let keep: Vec<usize> = excluded
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| if e { None } else { Some(i) })
            .collect();

        let shape = decomposition.shape();
        let eig_mix = decomposition.eig_mix();
        let range = window.resolve(eig_mix.nrows());
        let n_frames = range.len();

        if keep.is_empty() {
            info!("no components selected for reconstruction, returning empty movie");
            return Ok(Array3::zeros((n_frames, shape.height, shape.width)));
        }

        let eig_vec = decomposition.eig_vec();
        let expected = expected_rows(&shape, decomposition.mask());
        if eig_vec.nrows() != expected {
            return Err(SeasError::shape(
                "spatial factors",
                format!("{} rows", expected),
                format!("{} rows", eig_vec.nrows()),
            ));
        }

        info!(
            "rebuilding {} of {} components over frames {:?}",
            keep.len(),
            decomposition.n_components(),
            range
        );
        let spatial = eig_vec.select(Axis(1), &keep);
        let mut temporal = eig_mix.select(Axis(1), &keep);
        if self.apply_component_filter() {
            debug!(
                "low-pass filtering component time courses at {} Hz",
                self.component_high_cutoff()
            );
            for mut column in temporal.columns_mut() {
                let smoothed = filter.butterworth(
                    column.view(),
                    Band::LowPass(self.component_high_cutoff()),
                    self.fps(),
                )?;
                if smoothed.len() != column.len() {
                    return Err(SeasError::shape(
                        "filtered time course",
                        column.len(),
                        smoothed.len(),
                    ));
                }
                column.assign(&smoothed);
            }
        }

        let mut frames: Array2<F> = temporal
            .slice(s![range.clone(), ..])
            .dot(&spatial.t());
        debug!("rebuilt frames: {:?}", frames.dim());

        let mean = if self.apply_mean_filter() {
            filter_mean(
                decomposition.mean(),
                self.filter_method(),
                self.mean_low_cutoff(),
                self.mean_high_cutoff(),
                self.fps(),
                filter,
            )?
            .signal
        } else {
            debug!("not filtering mean");
            decomposition.mean().clone()
        };
        let mean = mean.slice(s![range]);

        if self.apply_masked_mean() {
            let masks = decomposition
                .component_masks()
                .ok_or(SeasError::MissingField("component_masks"))?;
            let covered = masks
                .select(Axis(1), &keep)
                .map_axis(Axis(1), |row| row.iter().any(|&m| m));
            for (mut column, &on) in frames.columns_mut().into_iter().zip(covered.iter()) {
                if on {
                    column += &mean;
                }
            }
        } else {
            frames += &mean.insert_axis(Axis(1));
        }

        unflatten_frames(frames, shape.with_time(n_frames), decomposition.mask())
    }

    /// Load a decomposition from `source` and rebuild it, see [`RebuildValidParams::rebuild`]
    pub fn rebuild_from<F, Src, T>(
        &self,
        source: &Src,
        selection: &ComponentSelection,
        window: TimeWindow,
        filter: &T,
    ) -> Result<Array3<F>>
    where
        F: Float,
        Src: DecompositionSource<F> + ?Sized,
        T: TimecourseFilter<F>,
    {
        let decomposition = source.load()?;
        self.rebuild(&decomposition, selection, window, filter)
    }

    /// Rebuild the raw, the artifact and the filtered movie side by side
    pub fn filter_comparison<F, T>(
        &self,
        decomposition: &Decomposition<F>,
        window: TimeWindow,
        filter: &T,
    ) -> Result<FilterComparison<F>>
    where
        F: Float,
        T: TimecourseFilter<F>,
    {
        info!("building filtered movie");
        let filtered = self.rebuild(decomposition, &ComponentSelection::Stored, window, filter)?;

        info!("building artifact movie");
        let artifact_only = artifact_selection(decomposition, self.include_noise())?;
        let artifact = self.with_noise().rebuild(
            decomposition,
            &ComponentSelection::Explicit(artifact_only),
            window,
            filter,
        )?;

        info!("building raw movie");
        let raw = self.with_noise().rebuild(
            decomposition,
            &ComponentSelection::IncludeAll,
            window,
            filter,
        )?;

        Ok(FilterComparison {
            raw,
            artifact,
            filtered,
        })
    }
}

impl RebuildParams {
    /// Check the parameters and rebuild, see [`RebuildValidParams::rebuild`]
    pub fn rebuild<F, T>(
        &self,
        decomposition: &Decomposition<F>,
        selection: &ComponentSelection,
        window: TimeWindow,
        filter: &T,
    ) -> Result<Array3<F>>
    where
        F: Float,
        T: TimecourseFilter<F>,
    {
        self.check_ref()?
            .rebuild(decomposition, selection, window, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::{DecomposeParams, DecompositionPath, FixedSummary, Provenance};
    use crate::movie::{MovieShape, SpatialMask};
    use crate::testing::{synthetic, FlatIsNoise, MarkerFilter, OracleIca, ScriptedSvd};
    use crate::traits::Toolkit;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn decomposed(mask: Option<&SpatialMask>) -> (Decomposition<f64>, Array2<f64>) {
        let data = synthetic();
        let oracle = match mask {
            Some(mask) => {
                // the mean is taken over active pixels, so the active patterns are re-centered
                let active = mask.crop_rows(data.oracle.sources.view()).unwrap();
                let offset = active.mean_axis(Axis(0)).unwrap();
                OracleIca {
                    sources: active - &offset,
                    mixing: data.oracle.mixing.clone(),
                }
            }
            None => data.oracle.clone(),
        };
        let toolkit = Toolkit::new(ScriptedSvd(array![1., 0.]), oracle, FlatIsNoise);
        let decomposition = DecomposeParams::new()
            .n_components(3)
            .decompose(data.matrix.view(), MovieShape::new(20, 10, 10), mask, &toolkit)
            .unwrap();

        (decomposition, data.matrix)
    }

    /// Two pixels in a single row, two components, three frames
    fn small() -> Decomposition<f64> {
        Decomposition::from_parts(
            array![1., 2., 3.],
            MovieShape::new(3, 1, 2),
            None,
            array![[1., 0.], [0., 1.]],
            array![[1., 10.], [3., 20.], [5., 30.]],
            array![false, true],
            0.5,
            DecompositionPath::Fixed(FixedSummary {
                flipped: array![false, false],
            }),
            Provenance {
                time_elapsed: 0.,
                timestamp: String::new(),
                date: String::new(),
                n_components: 2,
            },
        )
        .unwrap()
    }

    fn unfiltered() -> RebuildValidParams {
        RebuildParams::new().apply_mean_filter(false).check().unwrap()
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<ComponentSelection>();
        has_autotraits::<TimeWindow>();
        has_autotraits::<FilterComparison<f64>>();
    }

    #[test]
    fn window_bounds_are_clamped() {
        assert_eq!(TimeWindow::full().resolve(20), 0..20);
        assert_eq!(TimeWindow::from(5..12).resolve(20), 5..12);
        assert_eq!(TimeWindow::new(Some(15), Some(100)).resolve(20), 15..20);
        assert_eq!(TimeWindow::new(Some(30), None).resolve(20), 20..20);
        assert_eq!(TimeWindow::new(Some(8), Some(3)).resolve(20), 8..8);
    }

    #[test]
    fn including_everything_restores_the_movie() {
        let (decomposition, matrix) = decomposed(None);
        let movie = unfiltered()
            .rebuild(
                &decomposition,
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();

        let original =
            unflatten_frames(matrix.reversed_axes(), MovieShape::new(20, 10, 10), None).unwrap();
        assert_abs_diff_eq!(movie, original, epsilon = 1e-9);
    }

    #[test]
    fn empty_selection_gives_zeros_of_the_window() {
        let (decomposition, _) = decomposed(None);
        let movie = unfiltered()
            .rebuild(
                &decomposition,
                &ComponentSelection::Explicit(array![true, true, true]),
                TimeWindow::from(5..12),
                &MarkerFilter,
            )
            .unwrap();

        assert_eq!(movie.dim(), (7, 10, 10));
        assert!(movie.iter().all(|&v| v == 0.));
    }

    #[test]
    fn window_selects_frames() {
        let (decomposition, matrix) = decomposed(None);
        let movie = unfiltered()
            .rebuild(
                &decomposition,
                &ComponentSelection::IncludeAll,
                TimeWindow::new(Some(15), Some(40)),
                &MarkerFilter,
            )
            .unwrap();

        assert_eq!(movie.dim(), (5, 10, 10));
        // pixel (2, 3) at frame 16
        assert_abs_diff_eq!(movie[[1, 2, 3]], matrix[[23, 16]], epsilon = 1e-9);
    }

    #[test]
    fn masked_rebuild_leaves_inactive_pixels_zero() {
        let mut mask = Array2::from_elem((10, 10), true);
        mask[[0, 0]] = false;
        mask[[4, 7]] = false;
        let mask = SpatialMask::new(mask);
        let (decomposition, matrix) = decomposed(Some(&mask));

        let movie = unfiltered()
            .rebuild(
                &decomposition,
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();

        assert_eq!(movie.dim(), (20, 10, 10));
        for t in 0..20 {
            assert_eq!(movie[[t, 0, 0]], 0.);
            assert_eq!(movie[[t, 4, 7]], 0.);
        }

        let active = mask.crop_rows(matrix.view()).unwrap();
        let expected = unflatten_frames(
            active.reversed_axes(),
            MovieShape::new(20, 10, 10),
            Some(&mask),
        )
        .unwrap();
        assert_abs_diff_eq!(movie, expected, epsilon = 1e-9);
    }

    #[test]
    fn stored_selection_must_be_attached() {
        let mut decomposition = small();
        let params = unfiltered();

        assert_eq!(
            params.rebuild(
                &decomposition,
                &ComponentSelection::Stored,
                TimeWindow::full(),
                &MarkerFilter
            ),
            Err(SeasError::MissingField("artifact_components"))
        );

        decomposition
            .set_artifact_components(array![true, false])
            .unwrap();
        let movie = params
            .rebuild(
                &decomposition,
                &ComponentSelection::Stored,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();
        assert_abs_diff_eq!(
            movie,
            array![[[1., 11.]], [[2., 22.]], [[3., 33.]]]
        );
    }

    #[test]
    fn explicit_selection_must_match_the_components() {
        let result = unfiltered().rebuild(
            &small(),
            &ComponentSelection::Explicit(array![false]),
            TimeWindow::full(),
            &MarkerFilter,
        );
        assert!(matches!(result, Err(SeasError::ShapeMismatch { .. })));
    }

    #[test]
    fn noise_can_be_left_out() {
        let params = RebuildParams::new()
            .apply_mean_filter(false)
            .include_noise(false)
            .check()
            .unwrap();
        let movie = params
            .rebuild(
                &small(),
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();

        // component 1 is noise
        assert_abs_diff_eq!(movie, array![[[2., 1.]], [[5., 2.]], [[8., 3.]]]);
    }

    #[test]
    fn component_filter_smooths_kept_time_courses() {
        let params = RebuildParams::new()
            .apply_mean_filter(false)
            .apply_component_filter(true)
            .check()
            .unwrap();
        let movie = params
            .rebuild(
                &small(),
                &ComponentSelection::Explicit(array![false, true]),
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();

        // the marker low-pass maps v to v / 2 + 2
        assert_abs_diff_eq!(movie, array![[[3.5, 1.]], [[5.5, 2.]], [[7.5, 3.]]]);
    }

    #[test]
    fn mean_filter_is_applied_before_readdition() {
        let params = RebuildParams::new()
            .filter_method(crate::reconstruction::FilterMethod::Constant)
            .check()
            .unwrap();
        let movie = params
            .rebuild(
                &small(),
                &ComponentSelection::Explicit(array![true, true]),
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();
        // nothing kept, nothing added back
        assert!(movie.iter().all(|&v| v == 0.));

        let movie = params
            .rebuild(
                &small(),
                &ComponentSelection::Explicit(array![false, true]),
                TimeWindow::from(1..3),
                &MarkerFilter,
            )
            .unwrap();
        assert_abs_diff_eq!(movie, array![[[5., 2.]], [[7., 2.]]]);
    }

    #[test]
    fn masked_mean_needs_component_masks() {
        let mut decomposition = small();
        let params = RebuildParams::new()
            .apply_mean_filter(false)
            .apply_masked_mean(true)
            .check()
            .unwrap();

        assert_eq!(
            params.rebuild(
                &decomposition,
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter
            ),
            Err(SeasError::MissingField("component_masks"))
        );

        decomposition
            .set_component_masks(array![[true, false], [false, false]])
            .unwrap();
        let movie = params
            .rebuild(
                &decomposition,
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();

        // only pixel 0 is covered by a kept component
        assert_abs_diff_eq!(movie, array![[[2., 10.]], [[5., 20.]], [[8., 30.]]]);
    }

    #[test]
    fn comparison_splits_the_raw_movie() {
        let mut decomposition = small();
        decomposition
            .set_artifact_components(array![false, true])
            .unwrap();

        let comparison = unfiltered()
            .filter_comparison(&decomposition, TimeWindow::full(), &MarkerFilter)
            .unwrap();

        // every movie carries the mean once
        let mean = array![[[1., 1.]], [[2., 2.]], [[3., 3.]]];
        assert_abs_diff_eq!(
            &comparison.filtered + &comparison.artifact,
            &comparison.raw + &mean
        );
        assert_abs_diff_eq!(comparison.artifact, array![[[1., 11.]], [[2., 22.]], [[3., 33.]]]);
    }

    #[test]
    fn artifact_selection_inverts_the_removed_components() {
        let mut decomposition = small();
        decomposition
            .set_artifact_components(array![false, false])
            .unwrap();

        assert_eq!(
            artifact_selection(&decomposition, true).unwrap(),
            array![true, true]
        );
        assert_eq!(
            artifact_selection(&decomposition, false).unwrap(),
            array![true, false]
        );
    }

    #[test]
    fn rebuild_from_a_source() {
        let decomposition = small();
        let source: &dyn DecompositionSource<f64> = &decomposition;

        let movie = unfiltered()
            .rebuild_from(
                source,
                &ComponentSelection::IncludeAll,
                TimeWindow::full(),
                &MarkerFilter,
            )
            .unwrap();
        assert_eq!(movie.dim(), (3, 1, 2));
    }
}
