//! Global centroid sets in the four standard variants.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use hazard_processor::{make_base_centroids, save_centroids, CentroidVariant, LandMask, RegionIndex};
use tracing::info;

/// Sub-directory of a run, `%m_%Y` of the run date.
pub fn run_dir_name(date: NaiveDate) -> String {
    date.format("%m_%Y").to_string()
}

/// Build every variant from the land polygons and write them to `out_dir`.
pub fn run_centroids(land_path: &Path, regions_path: Option<&Path>, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let land = LandMask::from_path(land_path).with_context(|| format!("Failed to read land polygons {:?}", land_path))?;
    let regions = regions_path
        .map(|p| RegionIndex::from_path(p).with_context(|| format!("Failed to read region polygons {:?}", p)))
        .transpose()?;
    info!(polygons = land.len(), regions = regions.is_some(), "Loaded coastline");

    write_variants(&land, regions.as_ref(), &CentroidVariant::all(), out_dir)
}

/// Build and save the given variants.
pub fn write_variants(
    land: &LandMask,
    regions: Option<&RegionIndex>,
    variants: &[CentroidVariant],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(variants.len());
    for variant in variants {
        let centroids = make_base_centroids(&variant.params(), land, regions)?;
        let path = out_dir.join(variant.file_name());
        save_centroids(&path, &centroids)?;
        info!(
            litpop_aligned = variant.litpop_aligned,
            include_poles = variant.include_poles,
            centroids = centroids.len(),
            "Wrote centroid variant"
        );
        written.push(path);
    }
    Ok(written)
}
