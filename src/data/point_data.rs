//! PointData: named per-vertex arrays over a surface mesh.
//!
//! Each `PointArray` stores a fixed number of components per vertex in one
//! contiguous buffer, so the slice for vertex `v` is
//! `values[v * components..(v + 1) * components]`. Arrays are keyed by name
//! in a `BTreeMap` for deterministic iteration and I/O order.

use crate::data::field::{ScalarField, VectorField};
use crate::mesh_error::MeshError;
use std::collections::BTreeMap;

/// A single named point array with `components` values per vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct PointArray {
    components: usize,
    values: Vec<f64>,
}

impl PointArray {
    /// Wrap a flat buffer.
    ///
    /// # Errors
    /// `InvalidParameter` if `components == 0` or the buffer length is not a
    /// multiple of `components`.
    pub fn try_new(components: usize, values: Vec<f64>) -> Result<Self, MeshError> {
        if components == 0 {
            return Err(MeshError::InvalidParameter(
                "point array must have at least one component".into(),
            ));
        }
        if values.len() % components != 0 {
            return Err(MeshError::InvalidParameter(format!(
                "buffer of {} values is not a multiple of {components} components",
                values.len()
            )));
        }
        Ok(Self { components, values })
    }

    /// Number of values per vertex.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of vertices (tuples) stored.
    #[inline]
    pub fn tuples(&self) -> usize {
        self.values.len() / self.components
    }

    /// Flat vertex-ordered storage.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Read-only view of the tuple for vertex `v`, if it exists.
    #[inline]
    pub fn restrict(&self, v: usize) -> Option<&[f64]> {
        let start = v.checked_mul(self.components)?;
        self.values.get(start..start + self.components)
    }
}

impl From<&ScalarField> for PointArray {
    fn from(field: &ScalarField) -> Self {
        Self {
            components: 1,
            values: field.as_slice().to_vec(),
        }
    }
}

impl From<&VectorField> for PointArray {
    fn from(field: &VectorField) -> Self {
        Self {
            components: 3,
            values: field.to_flat(),
        }
    }
}

/// Named per-vertex arrays for one mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
    arrays: BTreeMap<String, PointArray>,
}

impl PointData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an array.
    pub fn insert(&mut self, name: impl Into<String>, array: PointArray) -> Option<PointArray> {
        self.arrays.insert(name.into(), array)
    }

    pub fn get(&self, name: &str) -> Option<&PointArray> {
        self.arrays.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Array names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    /// Iterate `(name, array)` in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PointArray)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fetch an array and check it has `vertex_count` tuples of `components`.
    ///
    /// # Errors
    /// `MissingArray`, `ComponentMismatch` or `ShapeMismatch`.
    pub fn try_array(
        &self,
        name: &str,
        components: usize,
        vertex_count: usize,
    ) -> Result<&PointArray, MeshError> {
        let array = self.get(name).ok_or_else(|| MeshError::MissingArray {
            name: name.to_string(),
        })?;
        if array.components() != components {
            return Err(MeshError::ComponentMismatch {
                array: name.to_string(),
                expected: components,
                found: array.components(),
            });
        }
        if array.tuples() != vertex_count {
            return Err(MeshError::ShapeMismatch {
                array: name.to_string(),
                expected: vertex_count,
                found: array.tuples(),
            });
        }
        Ok(array)
    }

    /// Read a 3-component array as a [`VectorField`].
    pub fn try_vector_field(&self, name: &str, vertex_count: usize) -> Result<VectorField, MeshError> {
        let array = self.try_array(name, 3, vertex_count)?;
        VectorField::from_flat(name, array.values())
    }

    /// Read a 1-component array as a [`ScalarField`].
    pub fn try_scalar_field(&self, name: &str, vertex_count: usize) -> Result<ScalarField, MeshError> {
        let array = self.try_array(name, 1, vertex_count)?;
        Ok(ScalarField::new(array.values().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> PointData {
        let mut pd = PointData::new();
        pd.insert(
            "WSS_000",
            PointArray::try_new(3, vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0]).unwrap(),
        );
        pd.insert("p", PointArray::try_new(1, vec![7.0, 8.0]).unwrap());
        pd
    }

    #[test]
    fn restrict_returns_vertex_tuple() {
        let pd = data();
        let wss = pd.get("WSS_000").unwrap();
        assert_eq!(wss.tuples(), 2);
        assert_eq!(wss.restrict(1), Some(&[0.0, 2.0, 0.0][..]));
        assert!(wss.restrict(2).is_none());
    }

    #[test]
    fn typed_access_checks_shape() {
        let pd = data();
        assert_eq!(pd.try_vector_field("WSS_000", 2).unwrap().len(), 2);
        assert_eq!(pd.try_scalar_field("p", 2).unwrap()[1], 8.0);
        assert!(matches!(
            pd.try_vector_field("WSS_000", 3),
            Err(MeshError::ShapeMismatch { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            pd.try_vector_field("p", 2),
            Err(MeshError::ComponentMismatch { expected: 3, found: 1, .. })
        ));
        assert_eq!(
            pd.try_vector_field("WSS_001", 2),
            Err(MeshError::MissingArray {
                name: "WSS_001".into()
            })
        );
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        assert!(PointArray::try_new(3, vec![1.0, 2.0]).is_err());
        assert!(PointArray::try_new(0, vec![]).is_err());
    }
}
