//! Common test fixtures for hazard preparation tests.

/// Common extents as `(min_x, min_y, max_x, max_y)`.
pub mod bbox {
    /// Swiss national grid extent in LV95 meters
    pub const LV95: (f64, f64, f64, f64) = (2_255_000.0, 840_000.0, 2_964_000.0, 1_479_000.0);

    /// Switzerland in lon/lat
    pub const SWITZERLAND: (f64, f64, f64, f64) = (5.9, 45.8, 10.5, 47.9);

    /// Global extent without the poles
    pub const GLOBAL_NO_POLES: (f64, f64, f64, f64) = (-180.0, -60.0, 180.0, 60.0);

    /// Global extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);
}

/// Well-known points.
pub mod points {
    /// Bern, lon/lat
    pub const BERN_WGS84: (f64, f64) = (7.43863, 46.95108);

    /// Bern, approximate LV95 easting/northing
    pub const BERN_LV95: (f64, f64) = (2_600_000.0, 1_200_000.0);

    /// Reference point of the swisstopo approximate formulas, lon/lat
    pub const SWISSTOPO_REFERENCE_WGS84: (f64, f64) = (8.730497, 46.044131);

    /// Reference point of the swisstopo approximate formulas, LV95
    pub const SWISSTOPO_REFERENCE_LV95: (f64, f64) = (2_700_000.0, 1_100_000.0);
}

/// Dates used across the tests, as proleptic Gregorian ordinals.
pub mod dates {
    /// 2021-06-28, a large hail day in Switzerland
    pub const HAIL_DAY_2021: i64 = 737_969;

    /// 2021-07-12
    pub const HAIL_DAY_2021_JULY: i64 = 737_983;

    /// 2022-06-04
    pub const HAIL_DAY_2022: i64 = 738_310;
}

/// GeoJSON documents for land masks and region lookups.
pub mod geojson {
    /// A 4x4 degree land square centred on (0, 0), region code 756.
    pub const LAND_SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"ISO_N3": "756", "NAME": "Square"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-2.0, -2.0], [2.0, -2.0], [2.0, 2.0], [-2.0, 2.0], [-2.0, -2.0]]]
            }
        }]
    }"#;

    /// Two islands in one multipolygon feature, region code 242.
    pub const ISLANDS: &str = r#"{
        "type": "Feature",
        "properties": {"id": 242},
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [
                [[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0], [10.0, 11.0], [10.0, 10.0]]],
                [[[20.0, 10.0], [21.0, 10.0], [21.0, 11.0], [20.0, 11.0], [20.0, 10.0]]]
            ]
        }
    }"#;
}
