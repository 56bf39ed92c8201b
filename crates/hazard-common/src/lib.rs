//! Common types and utilities shared across the hazard preparation crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{HazardPrepError, HazardPrepResult};
pub use grid::GridSpec;
pub use time::{event_name, from_ordinal, to_ordinal, year_of_ordinal};
