#![cfg_attr(docsrs, feature(doc_cfg))]
//! # wss-tsvi
//!
//! wss-tsvi computes the Topological Shear Variation Index (TSVI) of a
//! time-resolved wall shear stress (WSS) vector field sampled at the vertices
//! of a triangulated vessel-wall surface.
//!
//! For every vertex, TSVI measures how much the divergence of the
//! direction-normalized WSS field fluctuates around its cycle average:
//!
//! ```text
//! TSVI = sqrt( (1/T) * dt * sum_i (div_i - mean)^2 ),   i = 0 .. N-1,  N = floor(T/dt)
//! ```
//!
//! ## Features
//! - Immutable triangle surface with a CSR vertex star ([`topology`])
//! - Named point arrays and vertex fields ([`data`])
//! - Surface gradient/divergence estimator with explicit uniform or
//!   area weighting ([`algs::gradient`])
//! - Streaming temporal reduction with mergeable accumulators ([`algs::reduction`])
//! - Legacy VTK ([`io::vtk`]) and XML PolyData ([`io::vtp`]) surface I/O,
//!   chosen by file extension
//! - Optional `rayon` feature for data-parallel faces, vertices and samples
//!
//! ## Degenerate input
//!
//! Zero-magnitude WSS vectors and zero-area triangles do not abort a run.
//! They yield NaN at the affected vertices, which is kept in the output and
//! listed in [`pipeline::Diagnostics`]. Missing or misshapen arrays abort
//! before any computation.
//!
//! ## Usage
//!
//! ```no_run
//! use wss_tsvi::prelude::*;
//!
//! let surface = read_surface("wall.vtk")?;
//! let params = CycleParameters::try_new(0.8, 0.01, 0.001)?;
//! let report = TsviPipeline::new(params, PipelineOptions::default())?.run(&surface)?;
//! write_surface("tsvi.vtk", &report.into_output(&surface.mesh)?)?;
//! # Ok::<(), MeshError>(())
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod pipeline;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::gradient::{
        GradientOperator, GradientWeighting, Jacobian, VertexGradient, divergence,
        estimate_vertex_gradient,
    };
    pub use crate::algs::normalize::{NormalizedField, normalize};
    pub use crate::algs::reduction::{TemporalAccumulator, TemporalStats};
    pub use crate::config::{CycleParameters, TsviConfig};
    pub use crate::data::{PointArray, PointData, ScalarField, VectorField, WssSeries};
    pub use crate::io::{
        SurfaceData, SurfaceFormat, SurfaceReader, SurfaceWriter, TSVI_ARRAY, assemble_output,
        read_surface, write_surface,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::pipeline::{Diagnostics, PipelineOptions, TsviPipeline, TsviReport, run_config};
    pub use crate::topology::surface::TriangleMesh;
}
