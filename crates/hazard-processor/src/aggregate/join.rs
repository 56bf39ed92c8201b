//! Spatial join of hazard centroids onto target grid cells.

use std::collections::BTreeMap;

use hazard_common::{CrsCode, GridSpec};
use rayon::prelude::*;
use tracing::debug;

use super::reduce::CellAccumulator;
use crate::centroids::Centroids;
use crate::error::Result;
use crate::sparse::{self, SparseMatrix};

/// Target cell of every source centroid, `None` for centroids outside the grid.
///
/// Centroids are reprojected into `grid_crs` first when their CRS differs.
pub fn join_centroids(centroids: &Centroids, grid_crs: CrsCode, grid: &GridSpec) -> Result<Vec<Option<usize>>> {
    if centroids.crs != grid_crs {
        debug!(from = %centroids.crs, to = %grid_crs, n = centroids.len(), "Reprojecting centroids");
    }
    let points = centroids.coords_in(grid_crs)?;
    let cells: Vec<Option<usize>> = points.par_iter().map(|&(x, y)| grid.locate(x, y)).collect();

    let outside = cells.iter().filter(|c| c.is_none()).count();
    if outside > 0 {
        debug!(outside, total = cells.len(), "Centroids outside the target grid are dropped");
    }
    Ok(cells)
}

/// Group the non-zero intensities of one event by target cell.
///
/// The result is ordered by cell index.
pub fn group_event(intensity: &SparseMatrix, row: usize, cells: &[Option<usize>]) -> Vec<(usize, CellAccumulator)> {
    let mut groups: BTreeMap<usize, CellAccumulator> = BTreeMap::new();
    for (col, value) in sparse::row_entries(intensity, row) {
        if value == 0.0 {
            continue;
        }
        if let Some(cell) = cells.get(col).copied().flatten() {
            groups.entry(cell).or_default().push(value);
        }
    }
    groups.into_iter().collect()
}

/// Group every event in parallel.
pub fn group_all_events(intensity: &SparseMatrix, cells: &[Option<usize>]) -> Vec<Vec<(usize, CellAccumulator)>> {
    (0..intensity.nrows())
        .into_par_iter()
        .map(|row| group_event(intensity, row, cells))
        .collect()
}
