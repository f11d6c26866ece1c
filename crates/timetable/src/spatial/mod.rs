//! Spatial indexing and query utilities for the route map.

pub mod index;
pub mod queries;

pub use queries::{haversine_distance, interpolate};
