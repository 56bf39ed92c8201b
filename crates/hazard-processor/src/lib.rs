//! Hazard containers and spatial aggregation.
//!
//! This crate holds the event × centroid hazard model used by the
//! preparation jobs and the one piece of original processing logic: moving
//! a hazard from a fine source grid onto a coarser target grid.
//!
//! # Architecture
//!
//! ```text
//! Hazard (events × centroids, sparse)
//!      │
//!      ▼
//! aggregate_hazard(params)
//!      │
//!      ├─► Build empty target grid in the original CRS
//!      │
//!      ├─► Reproject centroids, join each one to its target cell
//!      │
//!      ├─► Reduce non-zero intensities per (event, cell)
//!      │         │
//!      │         └─► optional zero padding when zeros count as data
//!      │
//!      └─► Stack per-event rows, cell centres become new centroids
//!               │
//!               ▼
//!          AggregationOutput { hazard, raster, grid }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hazard_processor::{aggregate_hazard, AggregationParams, AggregationMethod};
//!
//! let params = AggregationParams {
//!     cell_size: 4000.0,
//!     method: AggregationMethod::Max,
//!     ..Default::default()
//! };
//! let output = aggregate_hazard(&hazard, &params)?;
//! save_hazard("MZC_max_4km.json.gz", &output.hazard)?;
//! ```

pub mod aggregate;
pub mod centroids;
pub mod coastline;
pub mod concat;
pub mod config;
pub mod error;
pub mod hazard;
pub mod io;
pub mod raster;
pub mod sparse;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate_hazard, create_empty_grid, AggregationMethod, AggregationOutput, AggregationParams};
pub use centroids::Centroids;
pub use coastline::{make_base_centroids, CentroidGridParams, CentroidVariant, LandMask, RegionIndex};
pub use concat::concat_hazards;
pub use config::ProcessorConfig;
pub use error::{HazardError, Result};
pub use hazard::Hazard;
pub use io::{load_centroids, load_hazard, load_raster, save_centroids, save_hazard, save_raster};
pub use raster::EventRaster;
pub use sparse::{SparseMatrix, SparseRowBuilder};
