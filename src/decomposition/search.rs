//! Adaptive search for the number of independent components
//!
//! The search starts from the linearity transition of the SVD spectrum times a multiplier and
//! grows the component count by half until the fraction of signal components drops below the
//! target, or until the count can grow no further. Components the search over-grew are cropped
//! afterwards.
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::algorithm::solve_with_retry;
use super::normalize::influence_order;
use crate::error::{Result, SeasError};
use crate::traits::{IcaFactors, IcaSolver, NoiseClassifier, NoiseLabels};
use crate::Float;

use super::result::Termination;

/// State of the growth loop after evaluating one decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchState {
    /// Run again with this many components
    Growing(usize),
    AcceptedByQuality,
    AcceptedByExhaustion,
}

/// Decide how to continue after a decomposition with `n_components`
pub(crate) fn next_state(
    n_components: usize,
    ceiling: usize,
    signal_fraction: f64,
    signal_target: f64,
) -> SearchState {
    if n_components == ceiling {
        SearchState::AcceptedByExhaustion
    } else if signal_fraction < signal_target {
        SearchState::AcceptedByQuality
    } else if n_components >= ceiling {
        SearchState::AcceptedByExhaustion
    } else {
        let grown = n_components + (n_components / 2).max(1);
        SearchState::Growing(grown.min(ceiling))
    }
}

pub(crate) struct SearchOutcome<F> {
    pub factors: IcaFactors<F>,
    pub labels: NoiseLabels<F>,
    pub termination: Termination,
    pub signal_fraction: f64,
    /// Component count of every evaluated decomposition, in order
    pub history: Vec<usize>,
}

impl<F> SearchOutcome<F> {
    pub fn increased_cutoff(&self) -> usize {
        self.history.len().saturating_sub(1)
    }
}

/// Grow the component count until the signal fraction falls below `signal_target`
///
/// Every ICA run is initialised from the leading block of the left singular vectors `u`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn adaptive_search<F, I, C>(
    x: ArrayView2<F>,
    u: &Array2<F>,
    initial: usize,
    ceiling: usize,
    signal_target: f64,
    max_iter: usize,
    ica: &I,
    classifier: &C,
) -> Result<SearchOutcome<F>>
where
    F: Float,
    I: IcaSolver<F> + IcaSolver<f64>,
    C: NoiseClassifier<F>,
{
    if ceiling == 0 || u.nrows() < ceiling || u.ncols() < ceiling {
        return Err(SeasError::shape(
            "adaptive search",
            format!("at least {} singular vectors", ceiling),
            format!("{:?}", u.dim()),
        ));
    }

    let mut n_components = initial.clamp(1, ceiling);
    let mut history = Vec::new();

    loop {
        info!("calculating ICA with {} components", n_components);
        history.push(n_components);

        let w_init = u
            .slice(s![..n_components, ..n_components])
            .mapv(|v| v.to_f64().unwrap_or(0.0));
        let factors = solve_with_retry(ica, x, n_components, Some(w_init.view()), max_iter)?;

        let labels = classifier.classify(factors.mixing.t())?;
        if labels.noise.len() != n_components {
            return Err(SeasError::shape(
                "noise labels",
                n_components,
                labels.noise.len(),
            ));
        }
        let signal_fraction = labels.signal_fraction();

        let termination = match next_state(n_components, ceiling, signal_fraction, signal_target) {
            SearchState::Growing(next) => {
                info!(
                    "components were {:.1}% signal, recalculating with {} components",
                    signal_fraction * 100.,
                    next
                );
                n_components = next;
                continue;
            }
            SearchState::AcceptedByQuality => {
                info!(
                    "components were under {:.0}% signal ({:.1}% signal)",
                    signal_target * 100.,
                    signal_fraction * 100.
                );
                Termination::Quality
            }
            SearchState::AcceptedByExhaustion => {
                info!(
                    "number of components maxed out at {} ({:.1}% signal)",
                    n_components,
                    signal_fraction * 100.
                );
                Termination::Exhaustion
            }
        };

        return Ok(SearchOutcome {
            factors,
            labels,
            termination,
            signal_fraction,
            history,
        });
    }
}

pub(crate) struct Cropped<F> {
    pub eig_vec: Array2<F>,
    pub eig_mix: Array2<F>,
    pub noise: Array1<bool>,
    pub lag1_full: Array1<F>,
}

/// Keep `round(crop_ratio * n_signal)` components of largest influence
///
/// Nothing is reordered when the decomposition is already at or below that size.
pub(crate) fn crop_excess_noise<F: Float>(
    factors: IcaFactors<F>,
    noise: Array1<bool>,
    lag1_full: Array1<F>,
    crop_ratio: f64,
) -> Cropped<F> {
    let n_components = factors.n_components();
    let n_signal = noise.iter().filter(|&&n| !n).count();
    let reduced = ((crop_ratio * n_signal as f64).round() as usize).max(1);
    debug!("reduced component count: {}", reduced);

    if reduced >= n_components {
        info!("not cropping, {} components kept", n_components);
        return Cropped {
            eig_vec: factors.sources,
            eig_mix: factors.mixing,
            noise,
            lag1_full,
        };
    }

    info!("cropping {} components to {}", n_components, reduced);
    let order = influence_order(&factors.mixing);
    let keep = &order[..reduced];

    Cropped {
        eig_vec: factors.sources.select(Axis(1), keep),
        eig_mix: factors.mixing.select(Axis(1), keep),
        noise: keep.iter().map(|&i| noise[i]).collect(),
        lag1_full: order.iter().map(|&i| lag1_full[i]).collect(),
    }
}
