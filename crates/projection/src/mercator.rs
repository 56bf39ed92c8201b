//! Spherical Web Mercator projection (EPSG:3857).

use std::f64::consts::PI;

/// WGS84 semi-major axis used as the sphere radius.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit beyond which Web Mercator is undefined in practice.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Convert longitude/latitude (degrees) to Web Mercator meters.
///
/// Latitudes are clamped to ±[`MAX_LATITUDE`].
pub fn to_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = EARTH_RADIUS * lon_deg.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
    (x, y)
}

/// Convert Web Mercator meters to longitude/latitude (degrees).
pub fn from_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = to_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_extent_edge() {
        let (x, y) = to_mercator(180.0, MAX_LATITUDE);
        assert!((x - 20_037_508.342_789_244).abs() < 1e-3);
        assert!((y - 20_037_508.342_789_244).abs() < 1.0);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = to_mercator(8.54, 47.37);
        let (lon, lat) = from_mercator(x, y);
        assert!((lon - 8.54).abs() < 1e-9);
        assert!((lat - 47.37).abs() < 1e-9);
    }
}
