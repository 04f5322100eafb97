//! Numerical algorithms of the TSVI pipeline.
//!
//! - [`normalize`]: vector field -> magnitudes + unit directions
//! - [`gradient`]: unit field -> per-vertex Jacobian -> divergence
//! - [`reduction`]: divergence samples -> mean + TSVI
//! - [`transform`]: geometric scaling applied before differentiation

pub mod gradient;
pub mod normalize;
pub mod reduction;
pub mod transform;

pub use gradient::{
    GradientOperator, GradientWeighting, Jacobian, VertexGradient, divergence,
    estimate_vertex_gradient,
};
pub use normalize::{NormalizedField, normalize};
pub use reduction::{TemporalAccumulator, TemporalStats, reduce_samples};
pub use transform::{CoordinateTransform, scale_mesh, transform_mesh};
