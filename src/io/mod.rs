//! Surface mesh I/O and the output assembler.
//!
//! This module provides trait-based readers and writers for loading and
//! saving a [`TriangleMesh`] together with its named point arrays, and
//! [`assemble_output`], which builds the minimal mesh that is persisted at
//! the end of a run.

pub mod vtk;
pub mod vtp;

use crate::data::field::ScalarField;
use crate::data::point_data::{PointArray, PointData};
use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Name of the single point array written to the output mesh.
pub const TSVI_ARRAY: &str = "TSVI";

/// Surface geometry plus named per-vertex arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceData {
    /// Vertex positions and triangle connectivity.
    pub mesh: TriangleMesh,
    /// Named point arrays keyed by user-provided identifiers.
    pub point_data: PointData,
}

impl SurfaceData {
    /// Create a container with geometry and no arrays.
    pub fn new(mesh: TriangleMesh) -> Self {
        Self {
            mesh,
            point_data: PointData::new(),
        }
    }

    /// Attach an array after checking it has one tuple per vertex.
    pub fn try_insert(&mut self, name: impl Into<String>, array: PointArray) -> Result<(), MeshError> {
        let name = name.into();
        if array.tuples() != self.mesh.vertex_count() {
            return Err(MeshError::ShapeMismatch {
                array: name,
                expected: self.mesh.vertex_count(),
                found: array.tuples(),
            });
        }
        self.point_data.insert(name, array);
        Ok(())
    }
}

/// Trait for mesh readers that produce surface + point data.
pub trait SurfaceReader {
    /// Parse surface data from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<SurfaceData, MeshError>;
}

/// Trait for mesh writers that serialize surface + point data.
pub trait SurfaceWriter {
    /// Write surface data to a writer.
    fn write<W: Write>(&self, writer: W, surface: &SurfaceData) -> Result<(), MeshError>;
}

/// On-disk surface format, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// Legacy ASCII VTK (`.vtk`).
    LegacyVtk,
    /// VTK XML PolyData with ASCII arrays (`.vtp`).
    XmlPolyData,
}

impl SurfaceFormat {
    /// `.vtp` (any case) selects XML PolyData; anything else is legacy VTK.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtp") => Self::XmlPolyData,
            _ => Self::LegacyVtk,
        }
    }
}

/// Read a surface file in the format named by its extension.
pub fn read_surface(path: impl AsRef<Path>) -> Result<SurfaceData, MeshError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshError::Io(format!("{}: {e}", path.display())))?;
    let input = BufReader::new(file);
    let surface = match SurfaceFormat::from_path(path) {
        SurfaceFormat::LegacyVtk => vtk::VtkReader.read(input)?,
        SurfaceFormat::XmlPolyData => vtp::VtpReader.read(input)?,
    };
    log::info!(
        "read {}: {} vertices, {} triangles, {} point arrays",
        path.display(),
        surface.mesh.vertex_count(),
        surface.mesh.face_count(),
        surface.point_data.len()
    );
    Ok(surface)
}

/// Write a surface file in the format named by its extension.
pub fn write_surface(path: impl AsRef<Path>, surface: &SurfaceData) -> Result<(), MeshError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshError::Io(format!("{}: {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    match SurfaceFormat::from_path(path) {
        SurfaceFormat::LegacyVtk => vtk::VtkWriter.write(&mut out, surface)?,
        SurfaceFormat::XmlPolyData => vtp::VtpWriter.write(&mut out, surface)?,
    }
    out.flush()?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Build the persisted result: the unscaled input geometry plus one `"TSVI"`
/// array. Input WSS arrays and intermediate fields are not carried over.
pub fn assemble_output(mesh: &TriangleMesh, tsvi: &ScalarField) -> Result<SurfaceData, MeshError> {
    let mut out = SurfaceData::new(mesh.clone());
    out.try_insert(TSVI_ARRAY, PointArray::from(tsvi))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_holds_only_tsvi() {
        let mesh = TriangleMesh::try_new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let out = assemble_output(&mesh, &ScalarField::new(vec![0.1, 0.2, 0.3])).unwrap();
        assert_eq!(out.point_data.names().collect::<Vec<_>>(), vec![TSVI_ARRAY]);
        assert_eq!(out.mesh, mesh);
    }

    #[test]
    fn tsvi_length_must_match_vertices() {
        let mesh = TriangleMesh::try_new(vec![[0.0; 3]; 3], vec![]).unwrap();
        assert!(assemble_output(&mesh, &ScalarField::new(vec![0.0; 2])).is_err());
    }

    #[test]
    fn extension_selects_format() {
        assert_eq!(SurfaceFormat::from_path(Path::new("wall.vtp")), SurfaceFormat::XmlPolyData);
        assert_eq!(SurfaceFormat::from_path(Path::new("WALL.VTP")), SurfaceFormat::XmlPolyData);
        assert_eq!(SurfaceFormat::from_path(Path::new("wall.vtk")), SurfaceFormat::LegacyVtk);
        assert_eq!(SurfaceFormat::from_path(Path::new("wall")), SurfaceFormat::LegacyVtk);
    }
}
