//! Coordinate reference system transformations.
//!
//! Implements the projections used by the hazard pipeline from scratch
//! without external dependencies.

pub mod lv95;
pub mod mercator;
pub mod transform;

pub use transform::{transform_point, transform_points, ProjectionError};
