//! End-to-end TSVI computation.
//!
//! Stages run strictly forward:
//!
//! ```text
//! SurfaceData --load--> WssSeries --normalize--> unit field --divergence--> div_i
//!                                                         (per sample)      |
//!                                      TSVI <--finish-- TemporalAccumulator <-+
//! ```
//!
//! All fatal checks (parameters, array presence, array shapes) happen before
//! the first sample is processed. Geometry scaling and triangle frames depend
//! only on the mesh, so they are built once per run and shared read-only by
//! every sample. With the `rayon` feature, samples are folded into per-worker
//! accumulators that are merged at the end.

use crate::algs::gradient::{GradientOperator, GradientWeighting};
use crate::algs::normalize::normalize;
use crate::algs::reduction::TemporalAccumulator;
use crate::algs::transform::scale_mesh;
use crate::config::{CycleParameters, DEFAULT_ARRAY_PREFIX, TsviConfig};
use crate::data::field::{ScalarField, VectorField};
use crate::data::time_series::WssSeries;
use crate::io::{SurfaceData, assemble_output, read_surface, write_surface};
use crate::mesh_error::MeshError;
use crate::topology::surface::TriangleMesh;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Tunables that are not part of the cycle definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Prefix of the time-indexed WSS point arrays.
    pub array_prefix: String,
    /// Per-vertex averaging of triangle gradients.
    pub weighting: GradientWeighting,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            array_prefix: DEFAULT_ARRAY_PREFIX.to_string(),
            weighting: GradientWeighting::default(),
        }
    }
}

/// A zero-magnitude WSS vector: vertex `vertex` at sample `sample`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DegenerateVector {
    pub sample: usize,
    pub vertex: usize,
}

/// Non-fatal findings of a run. NaN values they cause stay in the output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Zero-magnitude WSS vectors (NaN direction), sorted by sample then vertex.
    pub degenerate_vectors: Vec<DegenerateVector>,
    /// Zero-area triangles left out of gradient averaging.
    pub degenerate_faces: Vec<usize>,
    /// Vertices with no usable triangle (NaN divergence at every sample).
    pub orphan_vertices: Vec<usize>,
    /// Vertices on an open boundary, whose estimates use fewer triangles.
    pub boundary_vertices: Vec<usize>,
    /// Vertices whose TSVI is NaN or infinite.
    pub non_finite_vertices: Vec<usize>,
}

impl Diagnostics {
    /// True when nothing degenerate was met (boundary vertices do not count).
    pub fn is_clean(&self) -> bool {
        self.degenerate_vectors.is_empty()
            && self.degenerate_faces.is_empty()
            && self.orphan_vertices.is_empty()
            && self.non_finite_vertices.is_empty()
    }
}

/// Result of one TSVI run.
#[derive(Clone, Debug, PartialEq)]
pub struct TsviReport {
    /// TSVI per vertex.
    pub tsvi: ScalarField,
    /// Cycle-averaged divergence of the normalized WSS per vertex.
    pub mean_divergence: ScalarField,
    /// Number of samples (N).
    pub samples: usize,
    pub diagnostics: Diagnostics,
}

impl TsviReport {
    /// The minimal output mesh: `mesh` geometry plus the `"TSVI"` array.
    pub fn into_output(self, mesh: &TriangleMesh) -> Result<SurfaceData, MeshError> {
        assemble_output(mesh, &self.tsvi)
    }
}

/// Per-run state: cycle parameters and options.
#[derive(Clone, Debug, PartialEq)]
pub struct TsviPipeline {
    params: CycleParameters,
    options: PipelineOptions,
}

/// Per-sample output folded into the reduction.
struct SampleResult {
    divergence: ScalarField,
    degenerate: Vec<usize>,
}

impl TsviPipeline {
    /// Validate `params` and build a pipeline.
    pub fn new(params: CycleParameters, options: PipelineOptions) -> Result<Self, MeshError> {
        params.validate()?;
        Ok(Self { params, options })
    }

    #[inline]
    pub fn params(&self) -> &CycleParameters {
        &self.params
    }

    #[inline]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Load the WSS series for this cycle from `surface`.
    pub fn load_series(&self, surface: &SurfaceData) -> Result<WssSeries, MeshError> {
        WssSeries::load(
            &surface.point_data,
            &self.options.array_prefix,
            self.params.sample_count(),
            surface.mesh.vertex_count(),
        )
    }

    /// Compute TSVI for the WSS arrays stored on `surface`.
    pub fn run(&self, surface: &SurfaceData) -> Result<TsviReport, MeshError> {
        let series = self.load_series(surface)?;
        self.run_series(&surface.mesh, &series)
    }

    /// Compute TSVI for an already loaded series.
    ///
    /// # Errors
    /// `SampleCountMismatch` if the series does not hold exactly N samples,
    /// `ShapeMismatch` if its rows do not match the mesh.
    pub fn run_series(&self, mesh: &TriangleMesh, series: &WssSeries) -> Result<TsviReport, MeshError> {
        let n = self.params.sample_count();
        if series.len() != n {
            return Err(MeshError::SampleCountMismatch {
                expected: n,
                found: series.len(),
            });
        }
        if series.vertex_count() != mesh.vertex_count() {
            return Err(MeshError::ShapeMismatch {
                array: self.options.array_prefix.clone(),
                expected: mesh.vertex_count(),
                found: series.vertex_count(),
            });
        }
        log::info!(
            "TSVI: {} vertices, {} triangles, N = {n} (T = {}, dt = {}), scale = {}, {:?} weighting",
            mesh.vertex_count(),
            mesh.face_count(),
            self.params.period,
            self.params.dt,
            self.params.scale,
            self.options.weighting
        );

        let scaled = scale_mesh(mesh, self.params.scale)?;
        let operator = GradientOperator::new(&scaled, self.options.weighting);
        let vertex_count = mesh.vertex_count();

        let sample = |index: usize, field: &VectorField| -> Result<SampleResult, MeshError> {
            let normalized = normalize(field);
            if !normalized.degenerate.is_empty() {
                log::warn!(
                    "sample {index}: {} zero-magnitude WSS vector(s); their divergence is NaN",
                    normalized.degenerate.len()
                );
            }
            let divergence = operator.divergence(&normalized.unit)?;
            log::debug!("sample {index}: divergence computed");
            Ok(SampleResult {
                divergence,
                degenerate: normalized.degenerate,
            })
        };

        #[cfg(feature = "rayon")]
        let (acc, degenerate_vectors) = series
            .samples()
            .par_iter()
            .enumerate()
            .try_fold(
                || (TemporalAccumulator::new(vertex_count), Vec::new()),
                |(mut acc, mut degenerate), (index, field)| {
                    let result = sample(index, field)?;
                    acc.push(&result.divergence)?;
                    degenerate.extend(
                        result
                            .degenerate
                            .into_iter()
                            .map(|vertex| DegenerateVector { sample: index, vertex }),
                    );
                    Ok::<_, MeshError>((acc, degenerate))
                },
            )
            .try_reduce(
                || (TemporalAccumulator::new(vertex_count), Vec::new()),
                |(a, mut da), (b, db)| {
                    da.extend(db);
                    Ok((a.merge(b)?, da))
                },
            )?;

        #[cfg(not(feature = "rayon"))]
        let (acc, degenerate_vectors) = {
            let mut acc = TemporalAccumulator::new(vertex_count);
            let mut degenerate = Vec::new();
            for (index, field) in series.samples().iter().enumerate() {
                let result = sample(index, field)?;
                acc.push(&result.divergence)?;
                degenerate.extend(
                    result
                        .degenerate
                        .into_iter()
                        .map(|vertex| DegenerateVector { sample: index, vertex }),
                );
            }
            (acc, degenerate)
        };

        let mut degenerate_vectors = degenerate_vectors;
        degenerate_vectors.sort_unstable();

        let stats = acc.finish(&self.params)?;
        let diagnostics = Diagnostics {
            degenerate_vectors,
            degenerate_faces: operator.degenerate_faces().to_vec(),
            orphan_vertices: operator.orphan_vertices().to_vec(),
            boundary_vertices: mesh.boundary_vertices(),
            non_finite_vertices: stats.tsvi.non_finite_vertices(),
        };
        if !diagnostics.non_finite_vertices.is_empty() {
            log::warn!(
                "{} vertex(es) have non-finite TSVI; values are kept as-is",
                diagnostics.non_finite_vertices.len()
            );
        }
        log::info!("TSVI: done ({} samples)", stats.samples);

        Ok(TsviReport {
            tsvi: stats.tsvi,
            mean_divergence: stats.mean,
            samples: stats.samples,
            diagnostics,
        })
    }
}

/// Read `config.input_path`, compute TSVI and write `config.output_path`.
///
/// Nothing is written unless the whole computation succeeds.
pub fn run_config(config: &TsviConfig) -> Result<TsviReport, MeshError> {
    let pipeline = TsviPipeline::new(
        config.cycle(),
        PipelineOptions {
            array_prefix: config.array_prefix.clone(),
            weighting: config.weighting,
        },
    )?;
    let surface = read_surface(&config.input_path)?;
    let report = pipeline.run(&surface)?;
    let output = assemble_output(&surface.mesh, &report.tsvi)?;
    write_surface(&config.output_path, &output)?;
    Ok(report)
}
