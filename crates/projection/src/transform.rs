//! Point transformations between supported CRSs.
//!
//! Every transform routes through WGS84 longitude/latitude, so adding a CRS
//! only needs a forward and an inverse projection.

use hazard_common::CrsCode;
use thiserror::Error;

use crate::{lv95, mercator};

/// Errors raised while transforming coordinates.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("non-finite coordinate ({x}, {y}) when transforming {from} -> {to}")]
    NonFinite {
        x: f64,
        y: f64,
        from: CrsCode,
        to: CrsCode,
    },
}

fn to_wgs84(crs: CrsCode, x: f64, y: f64) -> (f64, f64) {
    match crs {
        CrsCode::Epsg4326 => (x, y),
        CrsCode::Epsg2056 => lv95::lv95_to_wgs84(x, y),
        CrsCode::Epsg3857 => mercator::from_mercator(x, y),
    }
}

fn from_wgs84(crs: CrsCode, lon: f64, lat: f64) -> (f64, f64) {
    match crs {
        CrsCode::Epsg4326 => (lon, lat),
        CrsCode::Epsg2056 => lv95::wgs84_to_lv95(lon, lat),
        CrsCode::Epsg3857 => mercator::to_mercator(lon, lat),
    }
}

/// Transform a single `(x, y)` point from one CRS to another.
///
/// Geographic coordinates are ordered `(lon, lat)`.
pub fn transform_point(from: CrsCode, to: CrsCode, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    if from == to {
        return Ok((x, y));
    }

    let (lon, lat) = to_wgs84(from, x, y);
    let (tx, ty) = from_wgs84(to, lon, lat);
    if !tx.is_finite() || !ty.is_finite() {
        return Err(ProjectionError::NonFinite { x, y, from, to });
    }
    Ok((tx, ty))
}

/// Transform a batch of points in place.
pub fn transform_points(from: CrsCode, to: CrsCode, points: &mut [(f64, f64)]) -> Result<(), ProjectionError> {
    if from == to {
        return Ok(());
    }
    for p in points.iter_mut() {
        *p = transform_point(from, to, p.0, p.1)?;
    }
    Ok(())
}
