//! End-to-end regridding of synthetic radar hail days.

use hazard_common::CrsCode;
use hazard_processor::{
    aggregate_hazard, load_hazard, save_hazard, sparse, AggregationMethod, AggregationParams, Centroids, Hazard,
    SparseRowBuilder,
};
use test_utils::{assert_approx_eq, create_hail_cell, create_hail_field, daily_ordinals, dates, radar_axis};

const NX: usize = 20;
const NY: usize = 16;

/// Two hail days on a 1 km radar patch near Bern, centroids in lon/lat.
fn radar_hazard() -> Hazard {
    let chx = radar_axis(2_600_500.0, 1000.0, NX);
    let chy = radar_axis(1_190_500.0, 1000.0, NY);

    let mut points = Vec::with_capacity(NX * NY);
    for y in &chy {
        for x in &chx {
            points.push((*x, *y));
        }
    }
    projection::transform_points(CrsCode::Epsg2056, CrsCode::Epsg4326, &mut points).unwrap();
    let centroids = Centroids::from_xy(&points, CrsCode::Epsg4326);

    let mut rows = SparseRowBuilder::new(NX * NY);
    for field in [create_hail_cell(NX, NY, 9, 8, 5.0, 60.0), create_hail_field(NX, NY, 42)] {
        let dense: Vec<f64> = field.iter().map(|v| *v as f64).collect();
        rows.push_dense_row(&dense).unwrap();
    }

    let mut hazard = Hazard::new("HL", "mm", centroids, rows.finish().unwrap()).unwrap();
    hazard.date = daily_ordinals(dates::HAIL_DAY_2021, 2);
    hazard.frequency = vec![0.5; 2];
    hazard
}

fn row_sum(matrix: &hazard_processor::SparseMatrix, row: usize) -> f64 {
    sparse::row_entries(matrix, row).iter().map(|(_, v)| v).sum()
}

#[test]
fn test_max_keeps_peak_and_metadata() {
    let hazard = radar_hazard();
    let out = aggregate_hazard(&hazard, &AggregationParams::default()).unwrap();

    assert_eq!(out.hazard.n_events(), 2);
    assert_eq!((out.grid.nx, out.grid.ny), (356, 321));
    assert_eq!(out.hazard.n_centroids(), 356 * 321);
    assert_eq!(out.hazard.frequency, vec![0.5, 0.5]);
    assert_eq!(out.hazard.date, hazard.date);

    let peak = sparse::row_entries(&out.hazard.intensity, 0)
        .into_iter()
        .map(|(_, v)| v)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_approx_eq!(peak, 60.0, 1e-6);

    // The 20x16 km patch touches at most 11x9 cells of 2 km.
    assert!(out.hazard.intensity.nnz() <= 2 * 11 * 9);
}

#[test]
fn test_sum_conserves_total_intensity() {
    let hazard = radar_hazard();
    let params = AggregationParams {
        cell_size: 4000.0,
        method: AggregationMethod::Sum,
        ..Default::default()
    };
    let out = aggregate_hazard(&hazard, &params).unwrap();

    for row in 0..2 {
        assert_approx_eq!(row_sum(&out.hazard.intensity, row), row_sum(&hazard.intensity, row), 1e-6);
    }
}

#[test]
fn test_padded_mean_scales_back_to_sum() {
    let hazard = radar_hazard();
    let params = AggregationParams {
        method: AggregationMethod::Mean,
        treat_zeros_as_nans: false,
        ..Default::default()
    };
    let out = aggregate_hazard(&hazard, &params).unwrap();

    // The hail cell fills whole 2 km cells, so groups are padded to four pixels.
    assert_approx_eq!(row_sum(&out.hazard.intensity, 0) * 4.0, row_sum(&hazard.intensity, 0), 1e-6);
}

#[test]
fn test_output_centroids_are_cell_centres_in_wgs84() {
    let out = aggregate_hazard(&radar_hazard(), &AggregationParams::default()).unwrap();
    let cell = out.grid.locate(2_600_000.0, 1_200_000.0).unwrap();
    let (x, y) = out.grid.cell_center(cell);
    let (lon, lat) = projection::transform_point(CrsCode::Epsg2056, CrsCode::Epsg4326, x, y).unwrap();

    assert_eq!(out.hazard.centroids.crs, CrsCode::Epsg4326);
    assert_approx_eq!(out.hazard.centroids.lon[cell], lon, 1e-9);
    assert_approx_eq!(out.hazard.centroids.lat[cell], lat, 1e-9);
}

#[test]
fn test_raster_and_file_round_trip() {
    let hazard = radar_hazard();
    let params = AggregationParams {
        return_raster: true,
        raster_dates: Some(vec![dates::HAIL_DAY_2021]),
        ..Default::default()
    };
    let out = aggregate_hazard(&hazard, &params).unwrap();

    let raster = out.raster.as_ref().unwrap();
    assert_eq!(raster.time, vec![dates::HAIL_DAY_2021]);
    let max = raster.data[0].iter().copied().fold(0.0f32, f32::max);
    assert_approx_eq!(max, 60.0, 1e-4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MZC_max_2km.json.gz");
    save_hazard(&path, &out.hazard).unwrap();
    let loaded = load_hazard(&path).unwrap();

    assert_eq!(loaded.event_id, out.hazard.event_id);
    assert_eq!(loaded.intensity, out.hazard.intensity);
    assert_eq!(loaded.centroids, out.hazard.centroids);
}
