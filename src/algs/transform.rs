//! Mesh transformation helpers for coordinate updates.
//!
//! Transforms return a new mesh and leave connectivity untouched. The input
//! mesh is never modified, so the unscaled geometry stays available for the
//! output file.

use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;

/// Coordinate update strategies for mesh transforms.
pub enum CoordinateTransform<'a> {
    /// Multiply every coordinate by one factor about the origin.
    Uniform(f64),
    /// Update coordinates using a user-supplied function.
    ///
    /// The function receives the vertex index and its position and returns
    /// the new position.
    Function(&'a dyn Fn(usize, [f64; 3]) -> [f64; 3]),
}

/// Apply a coordinate transformation, producing a new mesh with the same topology.
///
/// # Errors
/// `InvalidParameter` for a non-finite or non-positive uniform factor.
pub fn transform_mesh(
    mesh: &TriangleMesh,
    transform: CoordinateTransform<'_>,
) -> Result<TriangleMesh, MeshError> {
    match transform {
        CoordinateTransform::Uniform(factor) => {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(MeshError::InvalidParameter(format!(
                    "scale factor must be finite and > 0, got {factor}"
                )));
            }
            Ok(mesh.map_positions(|_, p| [p[0] * factor, p[1] * factor, p[2] * factor]))
        }
        CoordinateTransform::Function(update) => Ok(mesh.map_positions(|v, p| update(v, p))),
    }
}

/// Uniformly scale a mesh about the origin.
pub fn scale_mesh(mesh: &TriangleMesh, factor: f64) -> Result<TriangleMesh, MeshError> {
    transform_mesh(mesh, CoordinateTransform::Uniform(factor))
}
