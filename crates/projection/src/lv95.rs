//! Swiss CH1903+ / LV95 projection (EPSG:2056).
//!
//! Uses the swisstopo approximate formulas for converting between WGS84
//! and LV95. The polynomials are accurate to about one meter inside
//! Switzerland, which is well below the cell sizes used for regridding
//! radar hazard data (1 km and up).
//!
//! Auxiliary values are expressed relative to the old Bern observatory:
//! - Geographic: 169028.66" N, 26782.5" E, in units of 10000"
//! - Projected: 1'200'000 m N, 2'600'000 m E, in units of 1000 km

/// Latitude of the projection centre in arc seconds.
const BERN_LAT_ARCSEC: f64 = 169028.66;
/// Longitude of the projection centre in arc seconds.
const BERN_LON_ARCSEC: f64 = 26782.5;

/// Convert WGS84 longitude/latitude (degrees) to LV95 easting/northing (meters).
pub fn wgs84_to_lv95(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let phi = (lat_deg * 3600.0 - BERN_LAT_ARCSEC) / 10000.0;
    let lambda = (lon_deg * 3600.0 - BERN_LON_ARCSEC) / 10000.0;

    let phi2 = phi * phi;
    let lambda2 = lambda * lambda;

    let east = 2_600_072.37 + 211_455.93 * lambda
        - 10_938.51 * lambda * phi
        - 0.36 * lambda * phi2
        - 44.54 * lambda2 * lambda;

    let north = 1_200_147.07 + 308_807.95 * phi + 3_745.25 * lambda2 + 76.63 * phi2
        - 194.56 * lambda2 * phi
        + 119.79 * phi2 * phi;

    (east, north)
}

/// Convert LV95 easting/northing (meters) to WGS84 longitude/latitude (degrees).
pub fn lv95_to_wgs84(east: f64, north: f64) -> (f64, f64) {
    let y = (east - 2_600_000.0) / 1_000_000.0;
    let x = (north - 1_200_000.0) / 1_000_000.0;

    let y2 = y * y;
    let x2 = x * x;

    let lambda = 2.677_909_4 + 4.728_982 * y + 0.791_484 * y * x + 0.130_6 * y * x2
        - 0.043_6 * y2 * y;

    let phi = 16.902_389_2 + 3.238_272 * x
        - 0.270_978 * y2
        - 0.002_528 * x2
        - 0.044_7 * y2 * x
        - 0.014_0 * x2 * x;

    // Unit 10000" to degrees
    (lambda * 100.0 / 36.0, phi * 100.0 / 36.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dms(d: f64, m: f64, s: f64) -> f64 {
        d + m / 60.0 + s / 3600.0
    }

    #[test]
    fn test_swisstopo_reference_point() {
        // Reference example from the swisstopo formula documentation.
        let (e, n) = wgs84_to_lv95(dms(8.0, 43.0, 49.79), dms(46.0, 2.0, 38.87));
        assert!((e - 2_700_000.0).abs() < 1.0, "east was {}", e);
        assert!((n - 1_100_000.0).abs() < 1.0, "north was {}", n);
    }

    #[test]
    fn test_inverse_reference_point() {
        let (lon, lat) = lv95_to_wgs84(2_700_000.0, 1_100_000.0);
        assert!((lon - dms(8.0, 43.0, 49.79)).abs() < 1e-4, "lon was {}", lon);
        assert!((lat - dms(46.0, 2.0, 38.87)).abs() < 1e-4, "lat was {}", lat);
    }

    #[test]
    fn test_roundtrip_across_switzerland() {
        for &(e, n) in &[
            (2_485_000.0, 1_110_000.0), // Geneva
            (2_683_000.0, 1_248_000.0), // Zurich
            (2_722_000.0, 1_096_000.0), // Lugano
            (2_834_000.0, 1_180_000.0), // Engadin
        ] {
            let (lon, lat) = lv95_to_wgs84(e, n);
            let (e2, n2) = wgs84_to_lv95(lon, lat);
            assert!((e - e2).abs() < 10.0, "east roundtrip {} -> {}", e, e2);
            assert!((n - n2).abs() < 10.0, "north roundtrip {} -> {}", n, n2);
        }
    }
}
