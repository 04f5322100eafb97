//! MeshError: Unified error type for wss-tsvi public APIs
//!
//! Every fallible operation in the crate returns this error. Fatal input
//! problems (missing arrays, shape mismatches, bad parameters) are raised
//! while loading, before any numerical work starts. Numerical degeneracies
//! are *not* errors; they travel through the output as NaN and are listed in
//! [`Diagnostics`](crate::pipeline::Diagnostics).

use thiserror::Error;

/// Unified error type for wss-tsvi operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A required time-indexed point array is absent from the input mesh.
    #[error("missing point array `{name}`")]
    MissingArray { name: String },
    /// A point array does not have one row per mesh vertex.
    #[error("point array `{array}` has {found} rows, mesh has {expected} vertices")]
    ShapeMismatch {
        array: String,
        expected: usize,
        found: usize,
    },
    /// A point array has the wrong number of components per row.
    #[error("point array `{array}` has {found} components, expected {expected}")]
    ComponentMismatch {
        array: String,
        expected: usize,
        found: usize,
    },
    /// A triangle references a vertex outside `[0, vertex_count)`.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
    /// The temporal reduction folded a different number of samples than N.
    #[error("temporal reduction saw {found} samples, expected {expected}")]
    SampleCountMismatch { expected: usize, found: usize },
    /// Cycle or scaling parameters are out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Malformed mesh file contents.
    #[error("mesh I/O parse error: {0}")]
    MeshIoParse(String),
    /// Underlying I/O failure (message only, so the error stays `Clone`).
    #[error("I/O error: {0}")]
    Io(String),
    /// Configuration could not be read or decoded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        MeshError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(err: serde_json::Error) -> Self {
        MeshError::Config(err.to_string())
    }
}
