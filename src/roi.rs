//! Mean time courses of labelled regions, rebuilt from the components
use std::collections::BTreeMap;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::decomposition::Decomposition;
use crate::error::{Result, SeasError};
use crate::Float;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiOptions {
    /// Give label zero its own time course instead of treating it as unlabelled
    pub include_zero: bool,
    /// Leave the attached artifact components out, when there are any
    pub filter: bool,
    /// Rebuild from the artifact components instead of the signal ones
    pub invert_artifact: bool,
    pub include_noise: bool,
}

impl Default for RoiOptions {
    fn default() -> Self {
        RoiOptions {
            include_zero: true,
            filter: true,
            invert_artifact: false,
            include_noise: true,
        }
    }
}

/// One rebuilt time course per region label
#[derive(Debug, Clone, PartialEq)]
pub struct RoiTimecourses<F> {
    /// Distinct labels, ascending
    pub labels: Vec<usize>,
    /// `(labels, time)`, NaN for a region without any decomposed pixel
    pub timecourses: Array2<F>,
}

impl<F: Float> RoiTimecourses<F> {
    /// Time course of the region with this label
    pub fn get(&self, label: usize) -> Option<ndarray::ArrayView1<'_, F>> {
        self.labels
            .binary_search(&label)
            .ok()
            .map(|row| self.timecourses.row(row))
    }
}

fn component_selection<F: Float>(decomposition: &Decomposition<F>, options: &RoiOptions) -> Vec<usize> {
    let n_components = decomposition.n_components();
    let artifacts = match decomposition.artifact_components() {
        Some(artifacts) if options.filter => artifacts,
        _ => return (0..n_components).collect(),
    };

    let mut removed = artifacts.clone();
    if !options.include_noise {
        removed.zip_mut_with(decomposition.noise_components(), |r, &n| *r = *r || n);
    }
    if options.invert_artifact {
        debug!("rebuilding regions from artifact components");
    }

    removed
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| if r == options.invert_artifact { Some(i) } else { None })
        .collect()
}

/// Average the rebuilt signal over every labelled region of `regions`
///
/// `regions` holds a non-negative integer label per pixel of the frame. NaN marks unlabelled
/// pixels, and so does zero unless `include_zero` is set.
pub fn rebuild_roi_timecourses<F, D>(
    decomposition: &Decomposition<F>,
    regions: &ArrayBase<D, Ix2>,
    options: RoiOptions,
) -> Result<RoiTimecourses<F>>
where
    F: Float,
    D: Data<Elem = F>,
{
    let shape = decomposition.shape();
    if regions.dim() != shape.frame() {
        return Err(SeasError::shape(
            "region map",
            format!("{:?}", shape.frame()),
            format!("{:?}", regions.dim()),
        ));
    }

    let flat: Vec<F> = regions.iter().copied().collect();
    let row_labels: Vec<F> = match decomposition.mask() {
        Some(mask) => mask.active_indices().iter().map(|&i| flat[i]).collect(),
        None => flat.clone(),
    };

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &value in &flat {
        if let Some(label) = parse_label(value)? {
            members.entry(label).or_default();
        }
    }
    for (row, &value) in row_labels.iter().enumerate() {
        if let Some(label) = parse_label(value)? {
            members.entry(label).or_default().push(row);
        }
    }
    if !options.include_zero {
        members.remove(&0);
    }

    let selection = component_selection(decomposition, &options);
    info!(
        "rebuilding {} region time courses from {} components",
        members.len(),
        selection.len()
    );
    let eig_vec = decomposition.eig_vec().select(Axis(1), &selection);
    let eig_mix = decomposition.eig_mix().select(Axis(1), &selection);

    let mut timecourses = Array2::from_elem((members.len(), eig_mix.nrows()), F::nan());
    for (mut out, rows) in timecourses.outer_iter_mut().zip(members.values()) {
        if rows.is_empty() {
            continue;
        }
        let loading: Array1<F> = eig_vec
            .select(Axis(0), rows)
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(selection.len()));
        out.assign(&eig_mix.dot(&loading));
    }

    Ok(RoiTimecourses {
        labels: members.into_keys().collect(),
        timecourses,
    })
}

fn parse_label<F: Float>(value: F) -> Result<Option<usize>> {
    if value.is_nan() {
        return Ok(None);
    }
    if value < F::zero() || value.fract() != F::zero() {
        return Err(SeasError::InvalidValue(format!(
            "region labels must be non-negative integers, got {}",
            value
        )));
    }

    Ok(value.to_usize())
}
