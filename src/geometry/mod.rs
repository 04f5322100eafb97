//! Geometry utilities for wss-tsvi.
//!
//! This module provides triangle metrics (area, normal) and the affine
//! gradient frame used by the surface differential operator.

pub mod metrics;

pub use metrics::{TriangleFrame, triangle_area};
