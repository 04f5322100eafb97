//! Top-level module for mesh topology.
//!
//! The only topology the pipeline needs is a triangulated surface: vertex
//! positions, triangle connectivity and, per vertex, the list of incident
//! triangles.

pub mod surface;

pub use surface::TriangleMesh;
