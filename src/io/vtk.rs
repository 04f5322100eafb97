//! Legacy VTK (`.vtk`) reader/writer for triangulated surfaces.
//!
//! This implementation targets ASCII legacy VTK files.
//!
//! - The writer emits a `POLYDATA` dataset with `POLYGONS` and stores every
//!   point array as a `FIELD` array under `POINT_DATA`. Values are printed
//!   with the shortest representation that parses back to the same `f64`,
//!   so a write/read cycle is bit-identical (`NaN` and `inf` included).
//! - The reader accepts `POLYDATA` (`POLYGONS`) and `UNSTRUCTURED_GRID`
//!   (`CELLS` + `CELL_TYPES`) datasets, in both the classic
//!   `count i j k` connectivity layout and the `OFFSETS`/`CONNECTIVITY`
//!   layout of newer writers. Point arrays may come as `FIELD`, `SCALARS`,
//!   `VECTORS` or `NORMALS` blocks. Cell arrays are parsed and dropped.
//!   Anything that is not a triangle is rejected.

use crate::data::point_data::{PointArray, PointData};
use crate::io::{SurfaceData, SurfaceReader, SurfaceWriter};
use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;
use itertools::Itertools;
use std::io::{Read, Write};
use std::iter::Peekable;
use std::str::SplitWhitespace;

const VTK_TRIANGLE: i64 = 5;
const VTK_VERTEX: i64 = 1;

#[derive(Debug, Default, Clone, Copy)]
pub struct VtkReader;

#[derive(Debug, Default, Clone, Copy)]
pub struct VtkWriter;

impl SurfaceWriter for VtkWriter {
    fn write<W: Write>(&self, mut writer: W, surface: &SurfaceData) -> Result<(), MeshError> {
        let mesh = &surface.mesh;
        let faces = mesh.faces();

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "wss-tsvi")?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET POLYDATA")?;
        writeln!(writer, "POINTS {} double", mesh.vertex_count())?;
        for p in mesh.positions() {
            writeln!(writer, "{} {} {}", p[0], p[1], p[2])?;
        }

        writeln!(writer, "POLYGONS {} {}", faces.len(), faces.len() * 4)?;
        for [a, b, c] in faces {
            writeln!(writer, "3 {a} {b} {c}")?;
        }

        if surface.point_data.is_empty() {
            return Ok(());
        }
        writeln!(writer, "POINT_DATA {}", mesh.vertex_count())?;
        writeln!(writer, "FIELD FieldData {}", surface.point_data.len())?;
        for (name, array) in surface.point_data.iter() {
            if name.contains(char::is_whitespace) || name.is_empty() {
                return Err(MeshError::MeshIoParse(format!(
                    "array name `{name}` cannot be written to legacy VTK"
                )));
            }
            writeln!(
                writer,
                "{name} {} {} double",
                array.components(),
                array.tuples()
            )?;
            for tuple in array.values().chunks(array.components()) {
                writeln!(writer, "{}", tuple.iter().join(" "))?;
            }
        }
        Ok(())
    }
}

/// Whitespace token stream with typed accessors.
struct Tokens<'a> {
    inner: Peekable<SplitWhitespace<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace().peekable(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str, MeshError> {
        self.inner
            .next()
            .ok_or_else(|| MeshError::MeshIoParse(format!("missing {what}")))
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.inner.peek().copied()
    }

    fn next_usize(&mut self, what: &str) -> Result<usize, MeshError> {
        let token = self.next_token(what)?;
        token
            .parse()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {what} `{token}`")))
    }

    fn next_i64(&mut self, what: &str) -> Result<i64, MeshError> {
        let token = self.next_token(what)?;
        token
            .parse()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {what} `{token}`")))
    }

    fn next_f64(&mut self, what: &str) -> Result<f64, MeshError> {
        let token = self.next_token(what)?;
        token
            .parse()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {what} `{token}`")))
    }

    /// Read `count` values; allocation follows the tokens present, not `count`.
    fn next_f64s(&mut self, count: usize, what: &str) -> Result<Vec<f64>, MeshError> {
        (0..count).map(|_| self.next_f64(what)).collect()
    }

    fn expect(&mut self, keyword: &str) -> Result<(), MeshError> {
        let token = self.next_token(keyword)?;
        if !token.eq_ignore_ascii_case(keyword) {
            return Err(MeshError::MeshIoParse(format!(
                "expected {keyword}, found `{token}`"
            )));
        }
        Ok(())
    }
}

/// `a * b` for header-declared sizes, as a parse error on overflow.
fn declared_len(a: usize, b: usize, what: &str) -> Result<usize, MeshError> {
    a.checked_mul(b)
        .ok_or_else(|| MeshError::MeshIoParse(format!("{what} size {a} x {b} overflows")))
}

/// Which dataset attribute block subsequent arrays belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attribute {
    None,
    Point(usize),
    Cell(usize),
}

impl VtkReader {
    /// Read a cell block in either the `count i j k` or the
    /// `OFFSETS`/`CONNECTIVITY` layout.
    fn parse_cells(tokens: &mut Tokens<'_>, what: &str) -> Result<Vec<Vec<usize>>, MeshError> {
        let first = tokens.next_usize(&format!("{what} count"))?;
        let second = tokens.next_usize(&format!("{what} size"))?;
        if tokens.peek().is_some_and(|t| t.eq_ignore_ascii_case("OFFSETS")) {
            tokens.expect("OFFSETS")?;
            tokens.next_token("offsets type")?;
            let offsets = (0..first)
                .map(|_| tokens.next_usize("cell offset"))
                .collect::<Result<Vec<_>, _>>()?;
            tokens.expect("CONNECTIVITY")?;
            tokens.next_token("connectivity type")?;
            let connectivity = (0..second)
                .map(|_| tokens.next_usize("cell index"))
                .collect::<Result<Vec<_>, _>>()?;
            return offsets
                .iter()
                .tuple_windows()
                .map(|(&lo, &hi)| {
                    connectivity.get(lo..hi).map(<[usize]>::to_vec).ok_or_else(|| {
                        MeshError::MeshIoParse(format!("{what} offsets exceed connectivity"))
                    })
                })
                .collect();
        }
        (0..first)
            .map(|_| {
                let count = tokens.next_usize("cell size")?;
                (0..count)
                    .map(|_| tokens.next_usize("cell index"))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    fn parse_field(
        tokens: &mut Tokens<'_>,
        attribute: Attribute,
        point_data: &mut PointData,
    ) -> Result<(), MeshError> {
        let _field_name = tokens.next_token("field name")?;
        let num_arrays = tokens.next_usize("field array count")?;
        for _ in 0..num_arrays {
            let name = tokens.next_token("field array name")?;
            let components = tokens.next_usize("field components")?;
            let tuples = tokens.next_usize("field tuples")?;
            let _data_type = tokens.next_token("field type")?;
            let len = declared_len(components, tuples, name)?;
            let values = tokens.next_f64s(len, "field value")?;
            Self::store(attribute, name, components, values, point_data)?;
        }
        Ok(())
    }

    fn parse_scalars(
        tokens: &mut Tokens<'_>,
        attribute: Attribute,
        point_data: &mut PointData,
    ) -> Result<(), MeshError> {
        let name = tokens.next_token("scalars name")?;
        let _data_type = tokens.next_token("scalars type")?;
        let components = match tokens.peek() {
            Some(t) if t.eq_ignore_ascii_case("LOOKUP_TABLE") => 1,
            _ => tokens.next_usize("scalars components")?,
        };
        tokens.expect("LOOKUP_TABLE")?;
        let _table = tokens.next_token("lookup table name")?;
        let count = Self::tuple_count(attribute)?;
        let values = tokens.next_f64s(declared_len(components, count, name)?, "scalar value")?;
        Self::store(attribute, name, components, values, point_data)
    }

    fn parse_vectors(
        tokens: &mut Tokens<'_>,
        attribute: Attribute,
        point_data: &mut PointData,
    ) -> Result<(), MeshError> {
        let name = tokens.next_token("vectors name")?;
        let _data_type = tokens.next_token("vectors type")?;
        let count = Self::tuple_count(attribute)?;
        let values = tokens.next_f64s(declared_len(3, count, name)?, "vector value")?;
        Self::store(attribute, name, 3, values, point_data)
    }

    fn tuple_count(attribute: Attribute) -> Result<usize, MeshError> {
        match attribute {
            Attribute::Point(n) | Attribute::Cell(n) => Ok(n),
            Attribute::None => Err(MeshError::MeshIoParse(
                "attribute array outside POINT_DATA/CELL_DATA".into(),
            )),
        }
    }

    fn store(
        attribute: Attribute,
        name: &str,
        components: usize,
        values: Vec<f64>,
        point_data: &mut PointData,
    ) -> Result<(), MeshError> {
        match attribute {
            Attribute::Point(_) => {
                point_data.insert(name, PointArray::try_new(components, values)?);
            }
            // cell arrays and dataset-level FIELD data are not point data
            Attribute::Cell(_) | Attribute::None => {}
        }
        Ok(())
    }

    fn triangles(cells: Vec<Vec<usize>>) -> Result<Vec<[usize; 3]>, MeshError> {
        cells
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| match cell.as_slice() {
                &[a, b, c] => Ok([a, b, c]),
                other => Err(MeshError::MeshIoParse(format!(
                    "cell {idx} has {} vertices; only triangles are supported",
                    other.len()
                ))),
            })
            .collect()
    }
}

impl SurfaceReader for VtkReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<SurfaceData, MeshError> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        let mut lines = input.lines();
        let version = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("empty file".into()))?;
        if !version.starts_with("# vtk DataFile") {
            return Err(MeshError::MeshIoParse("not a legacy VTK file".into()));
        }
        let _title = lines.next();
        let format = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing ASCII line".into()))?;
        if format.trim() != "ASCII" {
            return Err(MeshError::MeshIoParse("VTK ASCII format required".into()));
        }
        let dataset = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing DATASET line".into()))?
            .trim();
        let unstructured = if dataset.ends_with("POLYDATA") {
            false
        } else if dataset.ends_with("UNSTRUCTURED_GRID") {
            true
        } else {
            return Err(MeshError::MeshIoParse(format!(
                "unsupported dataset `{dataset}`; POLYDATA or UNSTRUCTURED_GRID required"
            )));
        };

        let remaining = lines.collect::<Vec<_>>().join("\n");
        let mut tokens = Tokens::new(&remaining);

        let mut positions: Option<Vec<[f64; 3]>> = None;
        let mut cells: Vec<Vec<usize>> = Vec::new();
        let mut cell_types: Option<Vec<i64>> = None;
        let mut point_data = PointData::new();
        let mut attribute = Attribute::None;

        while let Some(token) = tokens.inner.next() {
            match token.to_ascii_uppercase().as_str() {
                "POINTS" => {
                    let n = tokens.next_usize("point count")?;
                    let _ty = tokens.next_token("point type")?;
                    let flat = tokens.next_f64s(declared_len(3, n, "POINTS")?, "point coordinate")?;
                    positions = Some(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect());
                }
                "POLYGONS" if !unstructured => {
                    cells.extend(Self::parse_cells(&mut tokens, "POLYGONS")?);
                }
                "VERTICES" | "LINES" if !unstructured => {
                    // not part of the surface
                    let _ = Self::parse_cells(&mut tokens, token)?;
                }
                "TRIANGLE_STRIPS" => {
                    return Err(MeshError::MeshIoParse(
                        "triangle strips are not supported".into(),
                    ));
                }
                "CELLS" if unstructured => {
                    cells.extend(Self::parse_cells(&mut tokens, "CELLS")?);
                }
                "CELL_TYPES" if unstructured => {
                    let n = tokens.next_usize("cell type count")?;
                    cell_types = Some(
                        (0..n)
                            .map(|_| tokens.next_i64("cell type"))
                            .collect::<Result<Vec<_>, _>>()?,
                    );
                }
                "POINT_DATA" => attribute = Attribute::Point(tokens.next_usize("point data count")?),
                "CELL_DATA" => attribute = Attribute::Cell(tokens.next_usize("cell data count")?),
                "FIELD" => Self::parse_field(&mut tokens, attribute, &mut point_data)?,
                "SCALARS" => Self::parse_scalars(&mut tokens, attribute, &mut point_data)?,
                "VECTORS" | "NORMALS" => Self::parse_vectors(&mut tokens, attribute, &mut point_data)?,
                _ => {
                    return Err(MeshError::MeshIoParse(format!("unexpected token {token}")));
                }
            }
        }

        let positions =
            positions.ok_or_else(|| MeshError::MeshIoParse("missing POINTS section".into()))?;

        if unstructured {
            let types = cell_types
                .ok_or_else(|| MeshError::MeshIoParse("missing CELL_TYPES section".into()))?;
            if types.len() != cells.len() {
                return Err(MeshError::MeshIoParse(format!(
                    "{} cell types for {} cells",
                    types.len(),
                    cells.len()
                )));
            }
            let mut kept = Vec::with_capacity(cells.len());
            for (idx, (cell, ty)) in cells.into_iter().zip(types).enumerate() {
                match ty {
                    VTK_TRIANGLE => kept.push(cell),
                    VTK_VERTEX => {}
                    other => {
                        return Err(MeshError::MeshIoParse(format!(
                            "cell {idx} has VTK type {other}; only triangles are supported"
                        )));
                    }
                }
            }
            cells = kept;
        }

        let mesh = TriangleMesh::try_new(positions, Self::triangles(cells)?)?;
        let mut surface = SurfaceData::new(mesh);
        for (name, array) in point_data.iter() {
            surface.try_insert(name, array.clone())?;
        }
        Ok(surface)
    }
}
