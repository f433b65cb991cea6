//! Ordering and sign convention of the components on the fixed-count path
use std::cmp::Ordering;

use ndarray::{Array1, Array2, Axis};

use crate::traits::IcaFactors;
use crate::Float;

/// Column order of decreasing time course standard deviation
///
/// The spread of a time course stands in for the eigenvalue influence of its component.
pub(crate) fn influence_order<F: Float>(eig_mix: &Array2<F>) -> Vec<usize> {
    let spread = eig_mix.std_axis(Axis(0), F::zero());
    let mut order: Vec<usize> = (0..spread.len()).collect();
    order.sort_by(|&a, &b| {
        spread[b]
            .partial_cmp(&spread[a])
            .unwrap_or(Ordering::Equal)
    });

    order
}

/// Negate every component whose spatial loading of largest magnitude is negative
///
/// Returns the flag of every flipped component. ICA components are sign indeterminate, so the
/// product of both factors is unchanged.
pub(crate) fn fix_signs<F: Float>(eig_vec: &mut Array2<F>, eig_mix: &mut Array2<F>) -> Array1<bool> {
    let mut flipped = Array1::from_elem(eig_vec.ncols(), false);

    for (i, flag) in flipped.iter_mut().enumerate() {
        let dominant = eig_vec
            .column(i)
            .iter()
            .copied()
            .fold(F::zero(), |best, v| if v.abs() > best.abs() { v } else { best });

        if dominant < F::zero() {
            eig_vec.column_mut(i).mapv_inplace(|v| -v);
            eig_mix.column_mut(i).mapv_inplace(|v| -v);
            *flag = true;
        }
    }

    flipped
}

/// Sort the components by influence and fix their signs
pub(crate) fn normalize_components<F: Float>(
    factors: IcaFactors<F>,
) -> (Array2<F>, Array2<F>, Array1<bool>) {
    let order = influence_order(&factors.mixing);
    let mut eig_vec = factors.sources.select(Axis(1), &order);
    let mut eig_mix = factors.mixing.select(Axis(1), &order);

    let flipped = fix_signs(&mut eig_vec, &mut eig_mix);

    (eig_vec, eig_mix, flipped)
}
