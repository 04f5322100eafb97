//! Vertex gradients (Jacobians) and divergence of a vertex-sampled vector field.
//!
//! The estimator works in two passes over a [`TriangleMesh`]:
//!
//! 1. **Per triangle.** Each component of the field is reconstructed as the
//!    affine interpolant of its three vertex values. Its gradient is constant
//!    over the triangle and lies in the triangle's plane (the normal resolves
//!    the otherwise underdetermined out-of-plane part to zero); see
//!    [`TriangleFrame`]. Stacking the three component gradients gives one
//!    3x3 Jacobian per triangle.
//! 2. **Per vertex.** The Jacobians of the triangles incident to a vertex are
//!    averaged according to [`GradientWeighting`].
//!
//! # Layout
//! [`Jacobian`] is row-major with `J[3 * i + j] = d v_i / d x_j`, so entries
//! 0, 4 and 8 are `dvx/dx`, `dvy/dy` and `dvz/dz` and their sum is the
//! divergence.
//!
//! # Degeneracies
//! - Zero-area triangles have no gradient. They are skipped under both
//!   weightings and listed in [`VertexGradient::degenerate_faces`].
//! - A vertex with no usable triangle gets a NaN Jacobian and is listed in
//!   [`VertexGradient::orphan_vertices`].
//! - Boundary vertices average over the triangles they have. No correction.
//! - NaN field values propagate into every triangle (and so every vertex)
//!   that touches them.

use crate::data::field::{ScalarField, VectorField};
use crate::geometry::metrics::TriangleFrame;
use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// How triangle Jacobians are combined at a shared vertex.
///
/// The choice changes results at vertices whose incident triangles differ in
/// size, so it is always passed explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientWeighting {
    /// Arithmetic mean over incident triangles.
    #[default]
    Uniform,
    /// Mean weighted by triangle area.
    Area,
}

/// Row-major 3x3 Jacobian of a vector field, `J[3 * i + j] = d v_i / d x_j`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Jacobian(pub [f64; 9]);

impl Jacobian {
    /// All entries NaN.
    pub const NAN: Jacobian = Jacobian([f64::NAN; 9]);

    /// `d v_row / d x_col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[3 * row + col]
    }

    /// Trace, i.e. the divergence `dvx/dx + dvy/dy + dvz/dz`.
    #[inline]
    pub fn trace(&self) -> f64 {
        self.0[0] + self.0[4] + self.0[8]
    }

    /// Jacobian of the affine interpolant of `values` over one triangle.
    fn on_triangle(frame: &TriangleFrame, values: [[f64; 3]; 3]) -> Self {
        let mut out = [0.0; 9];
        for i in 0..3 {
            let row = frame.gradient([values[0][i], values[1][i], values[2][i]]);
            out[3 * i..3 * i + 3].copy_from_slice(&row);
        }
        Jacobian(out)
    }
}

/// Per-vertex Jacobians plus the degeneracies met while computing them.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexGradient {
    /// One Jacobian per vertex, in vertex order.
    pub jacobians: Vec<Jacobian>,
    /// Zero-area triangles excluded from every average, ascending.
    pub degenerate_faces: Vec<usize>,
    /// Vertices with no usable incident triangle (Jacobian is NaN), ascending.
    pub orphan_vertices: Vec<usize>,
}

impl VertexGradient {
    /// Divergence field (Jacobian traces).
    pub fn divergence(&self) -> ScalarField {
        ScalarField::new(self.jacobians.iter().map(Jacobian::trace).collect())
    }
}

/// Gradient estimator bound to one mesh.
///
/// Triangle frames and per-vertex weight totals depend only on geometry, so
/// they are computed once here and reused for every field applied.
#[derive(Clone, Debug)]
pub struct GradientOperator<'m> {
    mesh: &'m TriangleMesh,
    weighting: GradientWeighting,
    frames: Vec<Option<TriangleFrame>>,
    weight_totals: Vec<f64>,
    degenerate_faces: Vec<usize>,
    orphan_vertices: Vec<usize>,
}

impl<'m> GradientOperator<'m> {
    /// Precompute triangle frames for `mesh`.
    pub fn new(mesh: &'m TriangleMesh, weighting: GradientWeighting) -> Self {
        #[cfg(feature = "rayon")]
        let frames: Vec<Option<TriangleFrame>> = (0..mesh.face_count())
            .into_par_iter()
            .map(|f| TriangleFrame::try_new(&mesh.face_vertices(f)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let frames: Vec<Option<TriangleFrame>> = (0..mesh.face_count())
            .map(|f| TriangleFrame::try_new(&mesh.face_vertices(f)))
            .collect();

        let degenerate_faces: Vec<usize> = frames
            .iter()
            .enumerate()
            .filter_map(|(f, frame)| frame.is_none().then_some(f))
            .collect();

        let weight_totals: Vec<f64> = (0..mesh.vertex_count())
            .map(|v| {
                mesh.incident_faces(v)
                    .filter_map(|f| frames[f].as_ref())
                    .map(|frame| face_weight(weighting, frame))
                    .sum()
            })
            .collect();
        let orphan_vertices: Vec<usize> = weight_totals
            .iter()
            .enumerate()
            .filter_map(|(v, &w)| (w <= 0.0).then_some(v))
            .collect();

        if !degenerate_faces.is_empty() {
            log::warn!(
                "{} zero-area triangle(s) excluded from gradient averaging (first: face {})",
                degenerate_faces.len(),
                degenerate_faces[0]
            );
        }
        if !orphan_vertices.is_empty() {
            log::warn!(
                "{} vertex(es) have no usable triangle; their Jacobian is NaN (first: vertex {})",
                orphan_vertices.len(),
                orphan_vertices[0]
            );
        }

        Self {
            mesh,
            weighting,
            frames,
            weight_totals,
            degenerate_faces,
            orphan_vertices,
        }
    }

    /// Averaging policy in use.
    #[inline]
    pub fn weighting(&self) -> GradientWeighting {
        self.weighting
    }

    /// Mesh the operator was built for.
    #[inline]
    pub fn mesh(&self) -> &'m TriangleMesh {
        self.mesh
    }

    /// Zero-area triangles, ascending.
    #[inline]
    pub fn degenerate_faces(&self) -> &[usize] {
        &self.degenerate_faces
    }

    /// Vertices without a usable triangle, ascending.
    #[inline]
    pub fn orphan_vertices(&self) -> &[usize] {
        &self.orphan_vertices
    }

    /// Per-triangle Jacobians (`None` for degenerate triangles).
    pub fn face_jacobians(&self, field: &VectorField) -> Result<Vec<Option<Jacobian>>, MeshError> {
        self.check_rows(field)?;
        let values = field.as_slice();
        let faces = self.mesh.faces();
        let jac = |f: usize| {
            self.frames[f].as_ref().map(|frame| {
                let [a, b, c] = faces[f];
                Jacobian::on_triangle(frame, [values[a], values[b], values[c]])
            })
        };
        #[cfg(feature = "rayon")]
        let out = (0..faces.len()).into_par_iter().map(jac).collect();
        #[cfg(not(feature = "rayon"))]
        let out = (0..faces.len()).map(jac).collect();
        Ok(out)
    }

    /// Per-vertex Jacobians of `field`.
    ///
    /// # Errors
    /// `ShapeMismatch` if `field` does not have one row per vertex.
    pub fn apply(&self, field: &VectorField) -> Result<VertexGradient, MeshError> {
        let face_jac = self.face_jacobians(field)?;
        let average = |v: usize| {
            let total = self.weight_totals[v];
            if total <= 0.0 {
                return Jacobian::NAN;
            }
            let mut acc = [0.0; 9];
            for f in self.mesh.incident_faces(v) {
                if let (Some(jac), Some(frame)) = (&face_jac[f], &self.frames[f]) {
                    let w = face_weight(self.weighting, frame);
                    for (a, j) in acc.iter_mut().zip(jac.0.iter()) {
                        *a += w * j;
                    }
                }
            }
            for a in &mut acc {
                *a /= total;
            }
            Jacobian(acc)
        };

        #[cfg(feature = "rayon")]
        let jacobians = (0..self.mesh.vertex_count())
            .into_par_iter()
            .map(average)
            .collect();
        #[cfg(not(feature = "rayon"))]
        let jacobians = (0..self.mesh.vertex_count()).map(average).collect();

        Ok(VertexGradient {
            jacobians,
            degenerate_faces: self.degenerate_faces.clone(),
            orphan_vertices: self.orphan_vertices.clone(),
        })
    }

    /// Divergence of `field` at every vertex.
    pub fn divergence(&self, field: &VectorField) -> Result<ScalarField, MeshError> {
        Ok(self.apply(field)?.divergence())
    }

    fn check_rows(&self, field: &VectorField) -> Result<(), MeshError> {
        if field.len() != self.mesh.vertex_count() {
            return Err(MeshError::ShapeMismatch {
                array: "vector field".into(),
                expected: self.mesh.vertex_count(),
                found: field.len(),
            });
        }
        Ok(())
    }
}

#[inline]
fn face_weight(weighting: GradientWeighting, frame: &TriangleFrame) -> f64 {
    match weighting {
        GradientWeighting::Uniform => 1.0,
        GradientWeighting::Area => frame.area,
    }
}

/// Estimate the per-vertex Jacobian of `field` over `mesh`.
///
/// One-shot form of [`GradientOperator::apply`]; build a `GradientOperator`
/// when several fields share the same mesh.
pub fn estimate_vertex_gradient(
    mesh: &TriangleMesh,
    field: &VectorField,
    weighting: GradientWeighting,
) -> Result<VertexGradient, MeshError> {
    GradientOperator::new(mesh, weighting).apply(field)
}

/// Divergence of `field` at each vertex, with the gradient it came from.
pub fn divergence(
    mesh: &TriangleMesh,
    field: &VectorField,
    weighting: GradientWeighting,
) -> Result<(ScalarField, VertexGradient), MeshError> {
    let gradient = estimate_vertex_gradient(mesh, field, weighting)?;
    Ok((gradient.divergence(), gradient))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    /// Unit square in z = 0 split along the 0-2 diagonal.
    fn square() -> TriangleMesh {
        TriangleMesh::try_new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn sample(mesh: &TriangleMesh, f: impl Fn([f64; 3]) -> [f64; 3]) -> VectorField {
        VectorField::new(mesh.positions().iter().map(|&p| f(p)).collect())
    }

    #[test]
    fn entries_are_row_component_column_coordinate() {
        // v = (y, 0, 0): only d vx / d y is non-zero, at offset 1 (not 3)
        let mesh = square();
        let field = sample(&mesh, |p| [p[1], 0.0, 0.0]);
        let grad = estimate_vertex_gradient(&mesh, &field, GradientWeighting::Uniform).unwrap();
        for jac in &grad.jacobians {
            assert!(approx(jac.get(0, 1), 1.0));
            assert!(approx(jac.0[1], 1.0));
            assert!(approx(jac.0[3], 0.0));
            assert!(approx(jac.trace(), 0.0));
        }
    }

    #[test]
    fn linear_field_divergence_is_exact() {
        // v = (2x, -3y, 0) on the plane: div = -1 everywhere
        let mesh = square();
        let field = sample(&mesh, |p| [2.0 * p[0], -3.0 * p[1], 0.0]);
        for weighting in [GradientWeighting::Uniform, GradientWeighting::Area] {
            let (div, _) = divergence(&mesh, &field, weighting).unwrap();
            for &d in div.as_slice() {
                assert!(approx(d, -1.0));
            }
        }
    }

    #[test]
    fn constant_field_has_zero_jacobian() {
        let mesh = square();
        let field = sample(&mesh, |_| [0.3, -0.4, 0.5]);
        let grad = estimate_vertex_gradient(&mesh, &field, GradientWeighting::Area).unwrap();
        for jac in &grad.jacobians {
            assert!(jac.0.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn weighting_changes_results_at_irregular_vertices() {
        // vertex 0 is shared by a large and a small triangle with different
        // gradients of the piecewise-linear field
        let mesh = TriangleMesh::try_new(
            vec![
                [0.0, 0.0, 0.0],
                [4.0, 0.0, 0.0],
                [0.0, 4.0, 0.0],
                [-1.0, 0.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        // vx = 1 at vertex 1, 0 elsewhere; vx = 1 at vertex 3 too
        let field = VectorField::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ]);
        let uniform = estimate_vertex_gradient(&mesh, &field, GradientWeighting::Uniform).unwrap();
        let area = estimate_vertex_gradient(&mesh, &field, GradientWeighting::Area).unwrap();
        // face 0: dvx/dx = 1/4 (area 8); face 1: dvx/dx = -1 (area 2)
        assert!(approx(uniform.jacobians[0].get(0, 0), (0.25 - 1.0) / 2.0));
        assert!(approx(area.jacobians[0].get(0, 0), (8.0 * 0.25 - 2.0 * 1.0) / 10.0));
    }

    #[test]
    fn degenerate_face_is_skipped_and_reported() {
        // face 1 is collinear; vertex 3 only touches it
        let mesh = TriangleMesh::try_new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        )
        .unwrap();
        let field = sample(&mesh, |p| [p[0], 0.0, 0.0]);
        let grad = estimate_vertex_gradient(&mesh, &field, GradientWeighting::Uniform).unwrap();
        assert_eq!(grad.degenerate_faces, vec![1]);
        assert_eq!(grad.orphan_vertices, vec![3]);
        assert!(approx(grad.jacobians[0].trace(), 1.0));
        assert!(grad.jacobians[3].trace().is_nan());
    }

    #[test]
    fn nan_value_spreads_to_neighbours_only() {
        let mesh = square();
        let mut rows = vec![[1.0, 0.0, 0.0]; 4];
        rows[1] = [f64::NAN; 3];
        let (div, _) = divergence(&mesh, &VectorField::new(rows), GradientWeighting::Uniform).unwrap();
        // vertex 1 sits in face 0 only; vertex 3 sits in face 1 only
        assert!(div[0].is_nan());
        assert!(div[1].is_nan());
        assert!(div[2].is_nan());
        assert_eq!(div[3], 0.0);
    }

    #[test]
    fn wrong_row_count_is_rejected() {
        let mesh = square();
        let field = VectorField::new(vec![[1.0, 0.0, 0.0]; 3]);
        assert!(matches!(
            estimate_vertex_gradient(&mesh, &field, GradientWeighting::Uniform),
            Err(MeshError::ShapeMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn weighting_deserializes_lowercase() {
        let w: GradientWeighting = serde_json::from_str("\"area\"").unwrap();
        assert_eq!(w, GradientWeighting::Area);
    }
}
