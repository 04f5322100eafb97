//! VTK XML PolyData (`.vtp`) reader/writer for triangulated surfaces.
//!
//! Only inline ASCII `DataArray`s are supported (`format="ascii"`); binary
//! and appended payloads are rejected. One `Piece` per file.
//!
//! - The writer emits `Points`, `Polys` (`connectivity` + `offsets`) and
//!   every point array as a `Float64` `DataArray` under `PointData`, using the
//!   same shortest round-trip number formatting as the legacy writer.
//! - The reader takes `Points`, triangle `Polys` and all `PointData`
//!   arrays. `Verts` and `Lines` are skipped, `CellData` is dropped, and
//!   strips or non-triangle polygons are a parse error.

use crate::data::point_data::{PointArray, PointData};
use crate::io::{SurfaceData, SurfaceReader, SurfaceWriter};
use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;
use itertools::Itertools;
use roxmltree::{Document, Node};
use std::io::{Read, Write};

/// Values per line inside a written `DataArray`.
const VALUES_PER_LINE: usize = 9;

#[derive(Debug, Default, Clone, Copy)]
pub struct VtpReader;

#[derive(Debug, Default, Clone, Copy)]
pub struct VtpWriter;

/// Escape text for use inside a double-quoted XML attribute.
fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn write_data_array<W: Write, T: std::fmt::Display>(
    writer: &mut W,
    indent: &str,
    number_type: &str,
    name: &str,
    components: usize,
    values: &[T],
) -> Result<(), MeshError> {
    writeln!(
        writer,
        "{indent}<DataArray type=\"{number_type}\" Name=\"{}\" NumberOfComponents=\"{components}\" format=\"ascii\">",
        escape_attr(name)
    )?;
    for line in values.chunks(VALUES_PER_LINE) {
        writeln!(writer, "{indent}  {}", line.iter().join(" "))?;
    }
    writeln!(writer, "{indent}</DataArray>")?;
    Ok(())
}

impl SurfaceWriter for VtpWriter {
    fn write<W: Write>(&self, mut writer: W, surface: &SurfaceData) -> Result<(), MeshError> {
        let mesh = &surface.mesh;
        let faces = mesh.faces();

        writeln!(writer, "<?xml version=\"1.0\"?>")?;
        writeln!(
            writer,
            "<VTKFile type=\"PolyData\" version=\"1.0\" byte_order=\"LittleEndian\" header_type=\"UInt64\">"
        )?;
        writeln!(writer, "  <PolyData>")?;
        writeln!(
            writer,
            "    <Piece NumberOfPoints=\"{}\" NumberOfVerts=\"0\" NumberOfLines=\"0\" NumberOfStrips=\"0\" NumberOfPolys=\"{}\">",
            mesh.vertex_count(),
            faces.len()
        )?;

        writeln!(writer, "      <PointData>")?;
        for (name, array) in surface.point_data.iter() {
            write_data_array(
                &mut writer,
                "        ",
                "Float64",
                name,
                array.components(),
                array.values(),
            )?;
        }
        writeln!(writer, "      </PointData>")?;

        writeln!(writer, "      <Points>")?;
        let coords: Vec<f64> = mesh.positions().iter().flatten().copied().collect();
        write_data_array(&mut writer, "        ", "Float64", "Points", 3, &coords)?;
        writeln!(writer, "      </Points>")?;

        writeln!(writer, "      <Polys>")?;
        let connectivity: Vec<usize> = faces.iter().flatten().copied().collect();
        let offsets: Vec<usize> = (1..=faces.len()).map(|f| 3 * f).collect();
        write_data_array(&mut writer, "        ", "Int64", "connectivity", 1, &connectivity)?;
        write_data_array(&mut writer, "        ", "Int64", "offsets", 1, &offsets)?;
        writeln!(writer, "      </Polys>")?;

        writeln!(writer, "    </Piece>")?;
        writeln!(writer, "  </PolyData>")?;
        writeln!(writer, "</VTKFile>")?;
        Ok(())
    }
}

/// One inline ASCII `DataArray`.
struct DataArray<'a> {
    name: &'a str,
    components: usize,
    text: &'a str,
}

impl<'a> DataArray<'a> {
    fn parse(node: Node<'a, '_>) -> Result<Self, MeshError> {
        let name = node.attribute("Name").unwrap_or("");
        let format = node.attribute("format").unwrap_or("ascii");
        if !format.eq_ignore_ascii_case("ascii") {
            return Err(MeshError::MeshIoParse(format!(
                "DataArray `{name}` uses format `{format}`; only ascii is supported"
            )));
        }
        let components = match node.attribute("NumberOfComponents") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                MeshError::MeshIoParse(format!("DataArray `{name}`: invalid NumberOfComponents `{raw}`"))
            })?,
            None => 1,
        };
        Ok(Self {
            name,
            components,
            text: node.text().unwrap_or(""),
        })
    }

    fn f64s(&self) -> Result<Vec<f64>, MeshError> {
        self.text
            .split_whitespace()
            .map(|t| {
                t.parse().map_err(|_| {
                    MeshError::MeshIoParse(format!("DataArray `{}`: invalid value `{t}`", self.name))
                })
            })
            .collect()
    }

    fn usizes(&self) -> Result<Vec<usize>, MeshError> {
        self.text
            .split_whitespace()
            .map(|t| {
                t.parse().map_err(|_| {
                    MeshError::MeshIoParse(format!("DataArray `{}`: invalid index `{t}`", self.name))
                })
            })
            .collect()
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn data_arrays<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.has_tag_name("DataArray"))
}

fn count_attr(piece: Node<'_, '_>, attr: &str) -> Result<usize, MeshError> {
    match piece.attribute(attr) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {attr} `{raw}`"))),
        None => Ok(0),
    }
}

impl VtpReader {
    fn points(piece: Node<'_, '_>, count: usize) -> Result<Vec<[f64; 3]>, MeshError> {
        let Some(points) = child(piece, "Points") else {
            return if count == 0 {
                Ok(Vec::new())
            } else {
                Err(MeshError::MeshIoParse("missing Points".into()))
            };
        };
        let node = data_arrays(points)
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing Points DataArray".into()))?;
        let array = DataArray::parse(node)?;
        if array.components != 3 {
            return Err(MeshError::MeshIoParse(format!(
                "Points must have 3 components, found {}",
                array.components
            )));
        }
        let flat = array.f64s()?;
        if flat.len() / 3 != count || flat.len() % 3 != 0 {
            return Err(MeshError::MeshIoParse(format!(
                "NumberOfPoints is {count} but Points holds {} values",
                flat.len()
            )));
        }
        Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    }

    fn triangles(piece: Node<'_, '_>) -> Result<Vec<[usize; 3]>, MeshError> {
        let Some(polys) = child(piece, "Polys") else {
            return Ok(Vec::new());
        };
        let mut connectivity = None;
        let mut offsets = None;
        for node in data_arrays(polys) {
            let array = DataArray::parse(node)?;
            match array.name {
                "connectivity" => connectivity = Some(array.usizes()?),
                "offsets" => offsets = Some(array.usizes()?),
                _ => {}
            }
        }
        let connectivity =
            connectivity.ok_or_else(|| MeshError::MeshIoParse("Polys missing connectivity".into()))?;
        let offsets = offsets.ok_or_else(|| MeshError::MeshIoParse("Polys missing offsets".into()))?;

        // offsets hold the end of each cell
        std::iter::once(0)
            .chain(offsets.iter().copied())
            .tuple_windows()
            .enumerate()
            .map(|(idx, (lo, hi))| match connectivity.get(lo..hi) {
                Some(&[a, b, c]) => Ok([a, b, c]),
                Some(other) => Err(MeshError::MeshIoParse(format!(
                    "polygon {idx} has {} vertices; only triangles are supported",
                    other.len()
                ))),
                None => Err(MeshError::MeshIoParse(format!(
                    "polygon {idx} offsets {lo}..{hi} exceed connectivity"
                ))),
            })
            .collect()
    }

    fn point_data(piece: Node<'_, '_>) -> Result<PointData, MeshError> {
        let mut point_data = PointData::new();
        let Some(block) = child(piece, "PointData") else {
            return Ok(point_data);
        };
        for node in data_arrays(block) {
            let array = DataArray::parse(node)?;
            if array.name.is_empty() {
                return Err(MeshError::MeshIoParse("PointData DataArray without Name".into()));
            }
            point_data.insert(array.name, PointArray::try_new(array.components, array.f64s()?)?);
        }
        Ok(point_data)
    }
}

impl SurfaceReader for VtpReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<SurfaceData, MeshError> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        let doc = Document::parse(&input)
            .map_err(|err| MeshError::MeshIoParse(format!("XML parse error: {err}")))?;

        let root = doc.root_element();
        if !root.has_tag_name("VTKFile") || root.attribute("type") != Some("PolyData") {
            return Err(MeshError::MeshIoParse("not a VTK XML PolyData file".into()));
        }
        if root.descendants().any(|n| n.has_tag_name("AppendedData")) {
            return Err(MeshError::MeshIoParse("appended data is not supported".into()));
        }
        let poly = child(root, "PolyData")
            .ok_or_else(|| MeshError::MeshIoParse("missing PolyData".into()))?;
        let mut pieces = poly.children().filter(|n| n.has_tag_name("Piece"));
        let piece = pieces
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing Piece".into()))?;
        if pieces.next().is_some() {
            return Err(MeshError::MeshIoParse("multi-piece files are not supported".into()));
        }
        if count_attr(piece, "NumberOfStrips")? > 0 {
            return Err(MeshError::MeshIoParse("triangle strips are not supported".into()));
        }

        let positions = Self::points(piece, count_attr(piece, "NumberOfPoints")?)?;
        let faces = Self::triangles(piece)?;
        let declared_polys = count_attr(piece, "NumberOfPolys")?;
        if declared_polys != faces.len() {
            return Err(MeshError::MeshIoParse(format!(
                "NumberOfPolys is {declared_polys} but Polys holds {} cells",
                faces.len()
            )));
        }
        let point_data = Self::point_data(piece)?;

        let mut surface = SurfaceData::new(TriangleMesh::try_new(positions, faces)?);
        for (name, array) in point_data.iter() {
            surface.try_insert(name, array.clone())?;
        }
        Ok(surface)
    }
}
