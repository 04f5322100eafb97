//! Triangulated surface topology with a frozen vertex star.
//!
//! `TriangleMesh` owns vertex positions and triangle connectivity and is
//! immutable once built. On construction it also builds a CSR (Compressed
//! Sparse Row) vertex star: for vertex `v`, the incident faces are
//! `star_faces[star_offsets[v]..star_offsets[v + 1]]`, sorted ascending so
//! per-vertex iteration order is deterministic.

use crate::mesh_error::MeshError;

/// Immutable triangle surface mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleMesh {
    positions: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
    star_offsets: Vec<usize>,
    star_faces: Vec<usize>,
}

impl TriangleMesh {
    /// Build a mesh, rejecting any face index outside `[0, positions.len())`.
    pub fn try_new(positions: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        let vertex_count = positions.len();
        for (face, tri) in faces.iter().enumerate() {
            for &index in tri {
                if index >= vertex_count {
                    return Err(MeshError::FaceIndexOutOfRange {
                        face,
                        index,
                        vertex_count,
                    });
                }
            }
        }
        let (star_offsets, star_faces) = build_star(vertex_count, &faces);
        Ok(Self {
            positions,
            faces,
            star_offsets,
            star_faces,
        })
    }

    /// Number of vertices (P).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions in vertex order.
    #[inline]
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    /// Triangle connectivity.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Corner positions of face `f`.
    #[inline]
    pub fn face_vertices(&self, f: usize) -> [[f64; 3]; 3] {
        let [a, b, c] = self.faces[f];
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Faces incident to vertex `v`, ascending.
    #[inline]
    pub fn incident_faces(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        let lo = self.star_offsets[v];
        let hi = self.star_offsets[v + 1];
        self.star_faces[lo..hi].iter().copied()
    }

    /// Number of faces incident to vertex `v`.
    #[inline]
    pub fn valence(&self, v: usize) -> usize {
        self.star_offsets[v + 1] - self.star_offsets[v]
    }

    /// Vertices on an open boundary: endpoints of edges used by exactly one face.
    pub fn boundary_vertices(&self) -> Vec<usize> {
        use std::collections::HashMap;
        let mut edge_use: HashMap<(usize, usize), u32> = HashMap::new();
        for tri in &self.faces {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                *edge_use.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        let mut on_boundary = vec![false; self.vertex_count()];
        for ((a, b), count) in edge_use {
            if count == 1 {
                on_boundary[a] = true;
                on_boundary[b] = true;
            }
        }
        on_boundary
            .iter()
            .enumerate()
            .filter_map(|(v, &flag)| flag.then_some(v))
            .collect()
    }

    /// A copy of this mesh with every vertex position replaced by `f(v, position)`.
    ///
    /// Connectivity and the vertex star are shared unchanged.
    pub fn map_positions<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, [f64; 3]) -> [f64; 3],
    {
        Self {
            positions: self
                .positions
                .iter()
                .enumerate()
                .map(|(v, &p)| f(v, p))
                .collect(),
            faces: self.faces.clone(),
            star_offsets: self.star_offsets.clone(),
            star_faces: self.star_faces.clone(),
        }
    }
}

fn build_star(vertex_count: usize, faces: &[[usize; 3]]) -> (Vec<usize>, Vec<usize>) {
    // degree counts
    let mut degree = vec![0usize; vertex_count];
    for tri in faces {
        for &v in tri {
            degree[v] += 1;
        }
    }

    // prefix sums
    let mut offsets = vec![0usize; vertex_count + 1];
    for v in 0..vertex_count {
        offsets[v + 1] = offsets[v] + degree[v];
    }

    // faces are visited in ascending order, so each row ends up sorted
    let mut write = offsets.clone();
    let mut star = vec![0usize; offsets[vertex_count]];
    for (f, tri) in faces.iter().enumerate() {
        for &v in tri {
            star[write[v]] = f;
            write[v] += 1;
        }
    }
    (offsets, star)
}
