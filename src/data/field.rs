//! Vertex-sampled fields.
//!
//! A field holds exactly one value per mesh vertex, in vertex order. Fields
//! are produced by one pipeline stage and consumed by the next; no stage
//! mutates a field it did not create.

use crate::mesh_error::MeshError;

/// One 3-component vector per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorField {
    values: Vec<[f64; 3]>,
}

impl VectorField {
    /// Wrap per-vertex vectors.
    pub fn new(values: Vec<[f64; 3]>) -> Self {
        Self { values }
    }

    /// Build from a flat `[x0, y0, z0, x1, ...]` buffer.
    ///
    /// # Errors
    /// `ComponentMismatch` if the buffer length is not a multiple of three.
    pub fn from_flat(name: &str, flat: &[f64]) -> Result<Self, MeshError> {
        if flat.len() % 3 != 0 {
            return Err(MeshError::ComponentMismatch {
                array: name.to_string(),
                expected: 3,
                found: flat.len() % 3,
            });
        }
        Ok(Self {
            values: flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        })
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row view.
    #[inline]
    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.values
    }

    /// Flatten back to `[x0, y0, z0, x1, ...]`.
    pub fn to_flat(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }
}

impl From<Vec<[f64; 3]>> for VectorField {
    fn from(values: Vec<[f64; 3]>) -> Self {
        Self::new(values)
    }
}

/// One scalar per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScalarField {
    values: Vec<f64>,
}

impl ScalarField {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// A field of `len` copies of `value`.
    pub fn filled(len: usize, value: f64) -> Self {
        Self {
            values: vec![value; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Vertices whose value is NaN or infinite.
    pub fn non_finite_vertices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(v, x)| (!x.is_finite()).then_some(v))
            .collect()
    }
}

impl From<Vec<f64>> for ScalarField {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl std::ops::Index<usize> for ScalarField {
    type Output = f64;

    fn index(&self, v: usize) -> &f64 {
        &self.values[v]
    }
}

impl std::ops::Index<usize> for VectorField {
    type Output = [f64; 3];

    fn index(&self, v: usize) -> &[f64; 3] {
        &self.values[v]
    }
}
