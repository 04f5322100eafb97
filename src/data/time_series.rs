//! Time-indexed WSS vector fields read from a mesh's point data.
//!
//! Arrays follow the naming convention `<prefix><index>` with a zero-padded
//! three digit index (`WSS_000`, `WSS_001`, ...). Every one of the N expected
//! arrays must be present with one 3-vector per vertex; loading fails on the
//! first missing or misshapen array so no computation starts on a partial
//! series.

use crate::data::field::VectorField;
use crate::data::point_data::PointData;
use crate::mesh_error::MeshError;

/// Name of the point array holding sample `index`.
///
/// ```
/// use wss_tsvi::data::time_series::wss_array_name;
/// assert_eq!(wss_array_name("WSS_", 7), "WSS_007");
/// assert_eq!(wss_array_name("WSS_", 1234), "WSS_1234");
/// ```
pub fn wss_array_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:03}")
}

/// Exactly N vector fields of P rows each, in sample order.
#[derive(Clone, Debug, PartialEq)]
pub struct WssSeries {
    vertex_count: usize,
    samples: Box<[VectorField]>,
}

impl WssSeries {
    /// Load samples `0..sample_count` named with `prefix` from `point_data`.
    ///
    /// # Errors
    /// - `MissingArray` for the first absent index.
    /// - `ComponentMismatch` / `ShapeMismatch` if an array is not `P x 3`.
    pub fn load(
        point_data: &PointData,
        prefix: &str,
        sample_count: usize,
        vertex_count: usize,
    ) -> Result<Self, MeshError> {
        // capacity grows with the arrays found, never with `sample_count`
        let samples = (0..sample_count)
            .map(|index| point_data.try_vector_field(&wss_array_name(prefix, index), vertex_count))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("loaded {sample_count} `{prefix}###` samples over {vertex_count} vertices");
        Ok(Self {
            vertex_count,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Build directly from in-memory fields, checking they share one row count.
    pub fn try_from_fields(vertex_count: usize, fields: Vec<VectorField>) -> Result<Self, MeshError> {
        for (index, field) in fields.iter().enumerate() {
            if field.len() != vertex_count {
                return Err(MeshError::ShapeMismatch {
                    array: format!("sample {index}"),
                    expected: vertex_count,
                    found: field.len(),
                });
            }
        }
        Ok(Self {
            vertex_count,
            samples: fields.into_boxed_slice(),
        })
    }

    /// Number of samples (N).
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rows per sample (P).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Samples in time order.
    #[inline]
    pub fn samples(&self) -> &[VectorField] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point_data::PointArray;

    fn store(names: &[&str], rows: usize) -> PointData {
        let mut pd = PointData::new();
        for name in names {
            pd.insert(*name, PointArray::try_new(3, vec![1.0; rows * 3]).unwrap());
        }
        pd
    }

    #[test]
    fn loads_every_sample_in_order() {
        let pd = store(&["WSS_000", "WSS_001", "WSS_002", "pressure"], 4);
        let series = WssSeries::load(&pd, "WSS_", 3, 4).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.vertex_count(), 4);
    }

    #[test]
    fn gap_in_indices_is_fatal() {
        let pd = store(&["WSS_000", "WSS_002"], 4);
        assert_eq!(
            WssSeries::load(&pd, "WSS_", 3, 4).unwrap_err(),
            MeshError::MissingArray {
                name: "WSS_001".into()
            }
        );
    }

    #[test]
    fn huge_sample_count_fails_on_first_missing_array() {
        let pd = store(&["WSS_000"], 4);
        assert_eq!(
            WssSeries::load(&pd, "WSS_", usize::MAX, 4).unwrap_err(),
            MeshError::MissingArray {
                name: "WSS_001".into()
            }
        );
    }

    #[test]
    fn row_count_must_match_mesh() {
        let pd = store(&["WSS_000"], 5);
        assert!(matches!(
            WssSeries::load(&pd, "WSS_", 1, 4),
            Err(MeshError::ShapeMismatch { expected: 4, found: 5, .. })
        ));
    }

    #[test]
    fn in_memory_fields_must_share_rows() {
        let fields = vec![
            VectorField::new(vec![[1.0, 0.0, 0.0]; 2]),
            VectorField::new(vec![[1.0, 0.0, 0.0]; 3]),
        ];
        assert!(WssSeries::try_from_fields(2, fields).is_err());
    }
}
