//! Hazard preparation jobs.
//!
//! Each module implements one subcommand of the `hazard-prep` binary:
//! regridding hail hazards, merging cyclone basins and building centroid
//! grids.

pub mod aggregate;
pub mod centroids;
pub mod concat;
pub mod config;
