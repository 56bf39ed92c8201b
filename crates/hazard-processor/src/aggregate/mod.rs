//! Regridding of a hazard onto a coarser regular grid.
//!
//! The hazard's non-zero intensities are joined onto the cells of an empty
//! grid built in the original CRS, reduced per `(event, cell)` and stacked
//! back into a sparse matrix whose centroids are the cell centres.

mod join;
pub mod reduce;

use std::collections::HashSet;
use std::time::Instant;

use hazard_common::{year_of_ordinal, BoundingBox, CrsCode, GridSpec};
use tracing::{debug, info, warn};

use crate::centroids::Centroids;
use crate::error::{HazardError, Result};
use crate::hazard::Hazard;
use crate::raster::EventRaster;
use crate::sparse::{self, SparseRowBuilder};

pub use reduce::{AggregationMethod, CellAccumulator};

/// Parameters for [`aggregate_hazard`].
#[derive(Debug, Clone)]
pub struct AggregationParams {
    /// CRS in which the target grid is laid out
    pub original_crs: CrsCode,
    /// Grid extent; ignored for LV95, which always uses the national extent
    pub extent: Option<BoundingBox>,
    /// Cell edge length in units of `original_crs`
    pub cell_size: f64,
    /// CRS of the output centroids
    pub output_crs: CrsCode,
    pub method: AggregationMethod,
    /// Treat zero intensity as missing rather than as a value
    pub treat_zeros_as_nans: bool,
    /// Date ordinals to rasterize; `None` rasterizes every event
    pub raster_dates: Option<Vec<i64>>,
    pub return_raster: bool,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            original_crs: CrsCode::Epsg2056,
            extent: None,
            cell_size: 2000.0,
            output_crs: CrsCode::Epsg4326,
            method: AggregationMethod::Max,
            treat_zeros_as_nans: true,
            raster_dates: None,
            return_raster: false,
        }
    }
}

/// Result of an aggregation run.
#[derive(Debug, Clone)]
pub struct AggregationOutput {
    pub hazard: Hazard,
    /// Event rasters, present when requested
    pub raster: Option<EventRaster>,
    /// Target grid in the original CRS
    pub grid: GridSpec,
}

/// Build the empty target grid.
///
/// LV95 always uses its fixed national extent; any other CRS needs an
/// explicit extent.
pub fn create_empty_grid(crs: CrsCode, cell_size: f64, extent: Option<&BoundingBox>) -> Result<GridSpec> {
    let extent = match (crs.default_extent(), extent) {
        (Some(default), Some(given)) => {
            warn!(
                crs = %crs,
                given = ?given,
                "Extent is ignored for this CRS, using the default extent"
            );
            default
        }
        (Some(default), None) => default,
        (None, Some(given)) => *given,
        (None, None) => {
            return Err(HazardError::invalid_parameters(format!(
                "an extent is required to build a grid in {}",
                crs
            )))
        }
    };

    let grid = GridSpec::from_extent(&extent, cell_size)?;
    debug!(crs = %crs, cell_size, nx = grid.nx, ny = grid.ny, "Created empty grid");
    Ok(grid)
}

/// Aggregate `hazard` onto a regular grid of `params.cell_size`.
pub fn aggregate_hazard(hazard: &Hazard, params: &AggregationParams) -> Result<AggregationOutput> {
    let start = Instant::now();
    hazard.check()?;

    if !params.treat_zeros_as_nans {
        if params.method == AggregationMethod::Max {
            return Err(HazardError::invalid_parameters(
                "max aggregation with zeros treated as values is not supported, set treat_zeros_as_nans",
            ));
        }
        warn!(
            method = %params.method,
            "Zeros are treated as values, groups are padded with zeros"
        );
    }
    if hazard.event_id.len() != hazard.date.len() {
        return Err(HazardError::invalid_hazard(format!(
            "hazard has {} event ids but {} dates",
            hazard.event_id.len(),
            hazard.date.len()
        )));
    }
    if !sparse::is_blank(&hazard.fraction) {
        return Err(HazardError::invalid_hazard(
            "aggregating a hazard with a populated fraction matrix is not supported",
        ));
    }

    let grid = create_empty_grid(params.original_crs, params.cell_size, params.extent.as_ref())?;

    info!(
        events = hazard.n_events(),
        centroids = hazard.n_centroids(),
        cells = grid.len(),
        cell_size = params.cell_size,
        method = %params.method,
        "Aggregating hazard"
    );

    let cells = join::join_centroids(&hazard.centroids, params.original_crs, &grid)?;
    let groups = join::group_all_events(&hazard.intensity, &cells);

    let padded_count = if params.treat_zeros_as_nans {
        None
    } else {
        let nmax = groups
            .iter()
            .flat_map(|row| row.iter().map(|(_, acc)| acc.count()))
            .max()
            .unwrap_or(0);
        debug!(nmax, "Padding groups with zeros");
        Some(nmax)
    };

    let mut builder = SparseRowBuilder::new(grid.len());
    let mut current_year = None;
    let mut empty_events = 0usize;
    for (row, event_groups) in groups.iter().enumerate() {
        let year = year_of_ordinal(hazard.date[row])?;
        if advances_year(&mut current_year, year) {
            info!(year, "Aggregating events of year");
        }

        if event_groups.is_empty() {
            empty_events += 1;
            builder.push_empty_row();
            continue;
        }
        builder.push_row(
            event_groups
                .iter()
                .filter_map(|(cell, acc)| acc.finish(params.method, padded_count).map(|v| (*cell, v))),
        )?;
    }
    let intensity = builder.finish()?;
    if empty_events > 0 {
        debug!(empty_events, "Events without intensity inside the grid");
    }

    let mut centers = grid.cell_centers();
    projection::transform_points(params.original_crs, params.output_crs, &mut centers)?;
    let centroids = Centroids::from_xy(&centers, params.output_crs);

    let aggregated = Hazard {
        haz_type: hazard.haz_type.clone(),
        units: hazard.units.clone(),
        centroids,
        event_id: hazard.event_id.clone(),
        event_name: hazard.event_name.clone(),
        date: hazard.date.clone(),
        orig: hazard.orig.clone(),
        frequency: hazard.frequency.clone(),
        frequency_unit: hazard.frequency_unit.clone(),
        fraction: sparse::zeros(intensity.nrows(), intensity.ncols()),
        intensity,
    };
    aggregated.check()?;

    let raster = if params.return_raster {
        Some(build_raster(&aggregated, &grid, params)?)
    } else {
        None
    };

    info!(
        events = aggregated.n_events(),
        cells = aggregated.n_centroids(),
        nnz = aggregated.intensity.nnz(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Aggregation complete"
    );

    Ok(AggregationOutput {
        hazard: aggregated,
        raster,
        grid,
    })
}

/// Record `year` when it is later than every year seen so far.
fn advances_year(latest: &mut Option<i32>, year: i32) -> bool {
    if latest.map_or(true, |y| year > y) {
        *latest = Some(year);
        true
    } else {
        false
    }
}

/// Rasterize the aggregated events selected by `params.raster_dates`.
fn build_raster(aggregated: &Hazard, grid: &GridSpec, params: &AggregationParams) -> Result<EventRaster> {
    let rows: Vec<usize> = match &params.raster_dates {
        Some(dates) => aggregated.rows_on_dates(dates),
        None => (0..aggregated.n_events()).collect(),
    };
    let (rows, empty): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&r| !sparse::row_entries(&aggregated.intensity, r).is_empty());
    if !empty.is_empty() {
        debug!(skipped = empty.len(), "Events without intensity left out of the raster");
    }
    if let Some(dates) = &params.raster_dates {
        let found: HashSet<i64> = rows.iter().map(|&r| aggregated.date[r]).collect();
        let missing = dates.iter().filter(|d| !found.contains(d)).count();
        if missing > 0 {
            warn!(missing, "Requested raster dates without an event");
        }
    }

    let (nx, ny) = (grid.nx, grid.ny);
    let chx: Vec<f64> = (0..nx).map(|ix| grid.cell_center(ix * ny).0.round()).collect();
    let chy: Vec<f64> = (0..ny).map(|iy| grid.cell_center(iy).1.round()).collect();

    let mut latlon = Vec::with_capacity(nx * ny);
    for iy in 0..ny {
        for ix in 0..nx {
            latlon.push(grid.cell_center(ix * ny + iy));
        }
    }
    projection::transform_points(params.original_crs, CrsCode::Epsg4326, &mut latlon)?;

    let data = rows
        .iter()
        .map(|&row| {
            let mut slice = vec![0.0f32; nx * ny];
            for (cell, value) in sparse::row_entries(&aggregated.intensity, row) {
                let (ix, iy) = grid.unflatten(cell);
                slice[iy * nx + ix] = value as f32;
            }
            slice
        })
        .collect();

    Ok(EventRaster {
        variable: "intensity".to_string(),
        units: aggregated.units.clone(),
        chx,
        chy,
        lat: latlon.iter().map(|p| p.1).collect(),
        lon: latlon.iter().map(|p| p.0).collect(),
        time: rows.iter().map(|&r| aggregated.date[r]).collect(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::to_ordinal;

    /// Four source points in LV95 around the Bern cell of a 2 km grid.
    fn lv95_hazard(values: &[[f64; 4]]) -> Hazard {
        let grid = create_empty_grid(CrsCode::Epsg2056, 2000.0, None).unwrap();
        let cell = grid.locate(2_600_500.0, 1_200_500.0).unwrap();
        let b = grid.cell_bounds(cell);
        let points = [
            (b.min_x + 250.0, b.min_y + 250.0),
            (b.min_x + 750.0, b.min_y + 250.0),
            (b.min_x + 250.0, b.min_y + 750.0),
            (b.min_x + 750.0, b.min_y + 750.0),
        ];
        let centroids = Centroids::from_xy(&points, CrsCode::Epsg2056);

        let mut rows = SparseRowBuilder::new(4);
        for v in values {
            rows.push_dense_row(v).unwrap();
        }
        let mut hazard = Hazard::new("HL", "mm", centroids, rows.finish().unwrap()).unwrap();
        let d0 = to_ordinal(chrono::NaiveDate::from_ymd_opt(2021, 6, 28).unwrap());
        hazard.date = (0..values.len() as i64).map(|i| d0 + i).collect();
        hazard
    }

    #[test]
    fn test_create_empty_grid_lv95_ignores_extent() {
        let grid = create_empty_grid(CrsCode::Epsg2056, 1000.0, Some(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        assert_eq!((grid.nx, grid.ny), (710, 640));
    }

    #[test]
    fn test_create_empty_grid_requires_extent() {
        assert!(create_empty_grid(CrsCode::Epsg3857, 1000.0, None).is_err());
        let grid = create_empty_grid(CrsCode::Epsg3857, 1000.0, Some(&BoundingBox::new(0.0, 0.0, 3000.0, 1000.0)))
            .unwrap();
        assert_eq!((grid.nx, grid.ny), (4, 2));
    }

    #[test]
    fn test_max_aggregation() {
        let hazard = lv95_hazard(&[[20.0, 0.0, 35.0, 25.0], [0.0, 0.0, 0.0, 0.0]]);
        let out = aggregate_hazard(&hazard, &AggregationParams::default()).unwrap();

        let cell = out.grid.locate(2_600_500.0, 1_200_500.0).unwrap();
        assert_eq!(out.hazard.n_events(), 2);
        assert_eq!(out.hazard.n_centroids(), out.grid.len());
        assert_eq!(sparse::row_entries(&out.hazard.intensity, 0), vec![(cell, 35.0)]);
        assert!(sparse::row_entries(&out.hazard.intensity, 1).is_empty());
        assert_eq!(out.hazard.event_id, hazard.event_id);
        assert_eq!(out.hazard.fraction.nrows(), 2);
        assert_eq!(out.hazard.centroids.crs, CrsCode::Epsg4326);
        assert!(out.raster.is_none());
    }

    #[test]
    fn test_mean_with_zero_padding() {
        let hazard = lv95_hazard(&[[20.0, 40.0, 10.0, 10.0], [20.0, 0.0, 0.0, 0.0]]);
        let params = AggregationParams {
            method: AggregationMethod::Mean,
            treat_zeros_as_nans: false,
            ..Default::default()
        };
        let out = aggregate_hazard(&hazard, &params).unwrap();
        let cell = out.grid.locate(2_600_500.0, 1_200_500.0).unwrap();
        assert_eq!(sparse::row_entries(&out.hazard.intensity, 0), vec![(cell, 20.0)]);
        // One value padded with three zeros.
        assert_eq!(sparse::row_entries(&out.hazard.intensity, 1), vec![(cell, 5.0)]);
    }

    #[test]
    fn test_max_with_zeros_as_values_is_rejected() {
        let hazard = lv95_hazard(&[[1.0, 0.0, 0.0, 0.0]]);
        let params = AggregationParams {
            treat_zeros_as_nans: false,
            ..Default::default()
        };
        assert!(matches!(
            aggregate_hazard(&hazard, &params),
            Err(HazardError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_date_length_mismatch_is_rejected() {
        let mut hazard = lv95_hazard(&[[1.0, 0.0, 0.0, 0.0]]);
        hazard.date.clear();
        assert!(aggregate_hazard(&hazard, &AggregationParams::default()).is_err());
    }

    #[test]
    fn test_year_log_only_moves_forward() {
        let mut latest = None;
        let logged: Vec<i32> = [2019, 2021, 2019, 2021, 2022]
            .into_iter()
            .filter(|&y| advances_year(&mut latest, y))
            .collect();
        assert_eq!(logged, vec![2019, 2021, 2022]);
    }

    #[test]
    fn test_inconsistent_hazard_is_rejected() {
        let mut hazard = lv95_hazard(&[[1.0, 0.0, 0.0, 0.0], [2.0, 0.0, 0.0, 0.0]]);
        hazard.event_id.truncate(1);
        hazard.event_name.truncate(1);
        hazard.date.truncate(1);
        hazard.orig.truncate(1);
        hazard.frequency.truncate(1);
        assert!(matches!(
            aggregate_hazard(&hazard, &AggregationParams::default()),
            Err(HazardError::InvalidHazard(_))
        ));
    }

    #[test]
    fn test_populated_fraction_is_rejected() {
        let mut hazard = lv95_hazard(&[[1.0, 0.0, 0.0, 0.0]]);
        let mut fraction = SparseRowBuilder::new(4);
        fraction.push_row(vec![(0, 1.0)]).unwrap();
        hazard.fraction = fraction.finish().unwrap();
        hazard.check().unwrap();
        assert!(matches!(
            aggregate_hazard(&hazard, &AggregationParams::default()),
            Err(HazardError::InvalidHazard(_))
        ));
    }

    #[test]
    fn test_raster_skips_events_without_intensity() {
        let hazard = lv95_hazard(&[[20.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]]);
        let params = AggregationParams {
            return_raster: true,
            raster_dates: Some(hazard.date.clone()),
            ..Default::default()
        };
        let out = aggregate_hazard(&hazard, &params).unwrap();
        assert_eq!(out.hazard.n_events(), 2);
        let raster = out.raster.unwrap();
        assert_eq!(raster.time, vec![hazard.date[0]]);
        assert_eq!(raster.n_times(), 1);
    }

    #[test]
    fn test_raster_for_selected_dates() {
        let hazard = lv95_hazard(&[[20.0, 0.0, 0.0, 0.0], [0.0, 30.0, 0.0, 0.0]]);
        let params = AggregationParams {
            return_raster: true,
            raster_dates: Some(vec![hazard.date[1]]),
            ..Default::default()
        };
        let out = aggregate_hazard(&hazard, &params).unwrap();
        let raster = out.raster.unwrap();
        assert_eq!(raster.n_times(), 1);
        assert_eq!(raster.time, vec![hazard.date[1]]);
        assert_eq!((raster.nx(), raster.ny()), (out.grid.nx, out.grid.ny));

        let cell = out.grid.locate(2_600_500.0, 1_200_500.0).unwrap();
        let (ix, iy) = out.grid.unflatten(cell);
        assert_eq!(raster.value(0, iy, ix), Some(30.0));
        assert_eq!(raster.chx[ix], 2_600_000.0);
        assert_eq!(raster.chy[iy], 1_201_000.0);
        assert!((raster.lat[iy * raster.nx() + ix] - 46.95).abs() < 0.05);
    }
}
