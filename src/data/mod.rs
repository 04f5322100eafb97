//! Data module: vertex fields and named point arrays

pub mod field;
pub mod point_data;
pub mod time_series;

pub use field::{ScalarField, VectorField};
pub use point_data::{PointArray, PointData};
pub use time_series::{WssSeries, wss_array_name};
