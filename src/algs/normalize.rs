//! Direction normalization of a vertex vector field.
//!
//! Each row is divided by its Euclidean magnitude. A zero-magnitude row has
//! no direction: its unit vector comes out NaN (`0 / 0`) and is left that
//! way, so the divergence and TSVI at that vertex are NaN too. The row index
//! is recorded in [`NormalizedField::degenerate`] so the caller can decide
//! what to do with it.

use crate::data::field::{ScalarField, VectorField};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Output of [`normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedField {
    /// Per-vertex magnitude.
    pub magnitude: ScalarField,
    /// Per-vertex unit vector (NaN where the magnitude is zero).
    pub unit: VectorField,
    /// Vertices whose unit vector is not finite, ascending.
    pub degenerate: Vec<usize>,
}

#[inline]
fn normalize_row(v: [f64; 3]) -> (f64, [f64; 3]) {
    let mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    (mag, [v[0] / mag, v[1] / mag, v[2] / mag])
}

/// Split `field` into magnitudes and unit directions.
pub fn normalize(field: &VectorField) -> NormalizedField {
    #[cfg(feature = "rayon")]
    let rows: Vec<(f64, [f64; 3])> = field.as_slice().par_iter().map(|&v| normalize_row(v)).collect();
    #[cfg(not(feature = "rayon"))]
    let rows: Vec<(f64, [f64; 3])> = field.as_slice().iter().map(|&v| normalize_row(v)).collect();

    let degenerate: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(v, (_, u))| u.iter().any(|c| !c.is_finite()).then_some(v))
        .collect();
    let (magnitude, unit): (Vec<f64>, Vec<[f64; 3]>) = rows.into_iter().unzip();

    NormalizedField {
        magnitude: ScalarField::new(magnitude),
        unit: VectorField::new(unit),
        degenerate,
    }
}
