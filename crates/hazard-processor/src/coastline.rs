//! Global land/ocean centroid grids.
//!
//! Land areas get a fine point grid and oceans a coarse one. Land polygons
//! come from GeoJSON, and a buffer around the coastline decides which grid
//! owns a point.

use std::fs;
use std::path::Path;

use geo::{BoundingRect, Contains, Coord, EuclideanDistance, LineString, Point, Polygon, Rect};
use geojson::{GeoJson, Geometry, JsonObject, PolygonType, Value};
use hazard_common::BoundingBox;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::centroids::Centroids;
use crate::error::{HazardError, Result};

/// A polygon with its precomputed bounding rectangle.
#[derive(Debug, Clone)]
struct IndexedPolygon {
    polygon: Polygon<f64>,
    rect: Rect<f64>,
}

impl IndexedPolygon {
    fn new(polygon: Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        Some(Self { polygon, rect })
    }

    fn near(&self, lon: f64, lat: f64, buffer: f64) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        lon >= min.x - buffer && lon <= max.x + buffer && lat >= min.y - buffer && lat <= max.y + buffer
    }

    fn contains_buffered(&self, lon: f64, lat: f64, buffer: f64) -> bool {
        if !self.near(lon, lat, buffer) {
            return false;
        }
        let point = Point::new(lon, lat);
        if self.polygon.contains(&point) {
            return true;
        }
        buffer > 0.0 && point.euclidean_distance(&self.polygon) <= buffer
    }
}

/// Union of land polygons in geographic coordinates.
#[derive(Debug, Clone)]
pub struct LandMask {
    polygons: Vec<IndexedPolygon>,
}

impl LandMask {
    /// Parse land polygons from a GeoJSON document.
    pub fn from_geojson_str(source: &str) -> Result<Self> {
        let geojson: GeoJson = source
            .parse()
            .map_err(|e: geojson::Error| HazardError::Geometry(e.to_string()))?;
        let polygons = read_features(geojson)?
            .into_iter()
            .flat_map(|(_, polys)| polys)
            .collect::<Vec<_>>();
        debug!(polygons = polygons.len(), "Loaded land polygons");
        Ok(Self { polygons })
    }

    /// Read land polygons from a GeoJSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading land polygons");
        Self::from_geojson_str(&fs::read_to_string(path)?)
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Check if the mask has no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Whether the point lies on land or within `buffer` degrees of it.
    pub fn contains_buffered(&self, lon: f64, lat: f64, buffer: f64) -> bool {
        self.polygons.iter().any(|p| p.contains_buffered(lon, lat, buffer))
    }

    /// [`contains_buffered`](Self::contains_buffered) for every centroid.
    pub fn mask(&self, centroids: &Centroids, buffer: f64) -> Vec<bool> {
        centroids
            .lon
            .par_iter()
            .zip(centroids.lat.par_iter())
            .map(|(&lon, &lat)| self.contains_buffered(lon, lat, buffer))
            .collect()
    }
}

/// Polygons tagged with a numeric region (country) code.
#[derive(Debug, Clone)]
pub struct RegionIndex {
    regions: Vec<(i32, IndexedPolygon)>,
}

/// Feature properties that may carry the region code, in lookup order.
const REGION_PROPERTIES: [&str; 2] = ["id", "ISO_N3"];

impl RegionIndex {
    /// Parse region polygons from a GeoJSON document.
    ///
    /// Features without a usable numeric code are skipped.
    pub fn from_geojson_str(source: &str) -> Result<Self> {
        let geojson: GeoJson = source
            .parse()
            .map_err(|e: geojson::Error| HazardError::Geometry(e.to_string()))?;

        let mut regions = Vec::new();
        let mut skipped = 0usize;
        for (properties, polygons) in read_features(geojson)? {
            match properties.as_ref().and_then(region_code) {
                Some(code) => regions.extend(polygons.into_iter().map(|p| (code, p))),
                None => skipped += 1,
            }
        }
        debug!(polygons = regions.len(), skipped, "Loaded region polygons");
        Ok(Self { regions })
    }

    /// Read region polygons from a GeoJSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading region polygons");
        Self::from_geojson_str(&fs::read_to_string(path)?)
    }

    /// Region code at a point, 0 when no region contains it.
    pub fn region_of(&self, lon: f64, lat: f64) -> i32 {
        self.regions
            .iter()
            .find(|(_, p)| p.contains_buffered(lon, lat, 0.0))
            .map_or(0, |(code, _)| *code)
    }

    /// Set `region_id` for every centroid.
    pub fn assign(&self, centroids: &mut Centroids) {
        let ids = centroids
            .lon
            .par_iter()
            .zip(centroids.lat.par_iter())
            .map(|(&lon, &lat)| self.region_of(lon, lat))
            .collect();
        centroids.region_id = Some(ids);
    }
}

fn region_code(properties: &JsonObject) -> Option<i32> {
    REGION_PROPERTIES.iter().find_map(|key| match properties.get(*key)? {
        serde_json::Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

type FeaturePolygons = (Option<JsonObject>, Vec<IndexedPolygon>);

fn read_features(geojson: GeoJson) -> Result<Vec<FeaturePolygons>> {
    let features: Vec<(Option<JsonObject>, Geometry)> = match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .into_iter()
            .filter_map(|f| f.geometry.map(|g| (f.properties, g)))
            .collect(),
        GeoJson::Feature(f) => f.geometry.map(|g| vec![(f.properties, g)]).unwrap_or_default(),
        GeoJson::Geometry(g) => vec![(None, g)],
    };

    features
        .into_iter()
        .map(|(properties, geometry)| {
            let polygons = only_polys(geometry)
                .into_iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .filter_map(IndexedPolygon::new)
                .collect();
            Ok((properties, polygons))
        })
        .collect()
}

fn only_polys(geometry: Geometry) -> Vec<PolygonType> {
    match geometry.value {
        Value::Polygon(p) => vec![p],
        Value::MultiPolygon(mp) => mp,
        Value::GeometryCollection(gc) => gc.into_iter().flat_map(only_polys).collect(),
        _ => Vec::new(),
    }
}

fn polygon(mut rings: PolygonType) -> Result<Polygon<f64>> {
    if rings.is_empty() {
        return Err(HazardError::Geometry("polygon without rings".into()));
    }
    let outer = line_string(rings.remove(0))?;
    let inners = rings.into_iter().map(line_string).collect::<Result<Vec<_>>>()?;
    let poly = Polygon::new(outer, inners);
    trace!(?poly, "converted polygon");
    Ok(poly)
}

fn line_string(points: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    let coords = points
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(HazardError::Geometry(format!("position with {} values", p.len()))),
        })
        .collect::<Result<Vec<_>>>()?;
    let ls = LineString::new(coords);
    if !ls.is_closed() {
        return Err(HazardError::Geometry("ring is not closed".into()));
    }
    Ok(ls)
}

/// Resolution, extent and coastline buffers of a centroid grid.
#[derive(Debug, Clone)]
pub struct CentroidGridParams {
    /// Lon/lat bounds of the result
    pub bounds: BoundingBox,
    pub res_land_arcsec: f64,
    pub res_ocean_arcsec: f64,
    /// Points within this many degrees of land belong to the land grid
    pub land_buffer: f64,
    /// Land points within this many degrees of land are flagged `on_land`
    pub on_land_buffer: f64,
    /// Place land points on the global pixel centres of the exposure grid
    pub litpop_aligned: bool,
}

impl Default for CentroidGridParams {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::new(-180.0, -60.0, 180.0, 60.0),
            res_land_arcsec: 150.0,
            res_ocean_arcsec: 1800.0,
            land_buffer: 0.1,
            on_land_buffer: 0.02,
            litpop_aligned: false,
        }
    }
}

/// One of the standard global centroid sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentroidVariant {
    pub litpop_aligned: bool,
    pub include_poles: bool,
}

impl CentroidVariant {
    /// All four combinations, in production order.
    pub fn all() -> [Self; 4] {
        [
            Self { litpop_aligned: true, include_poles: false },
            Self { litpop_aligned: true, include_poles: true },
            Self { litpop_aligned: false, include_poles: false },
            Self { litpop_aligned: false, include_poles: true },
        ]
    }

    /// Output file name of the variant.
    pub fn file_name(&self) -> String {
        format!(
            "earth_centroids_150asland_1800asoceans_distcoast_region_{}{}.json",
            if self.include_poles { "" } else { "nopoles_" },
            if self.litpop_aligned { "litpop_aligned_" } else { "" }
        )
    }

    /// Lon/lat bounds of the variant.
    pub fn bounds(&self) -> BoundingBox {
        if self.include_poles {
            BoundingBox::new(-180.0, -90.0, 180.0, 90.0)
        } else {
            BoundingBox::new(-180.0, -60.0, 180.0, 60.0)
        }
    }

    /// Grid parameters of the variant.
    pub fn params(&self) -> CentroidGridParams {
        CentroidGridParams {
            bounds: self.bounds(),
            litpop_aligned: self.litpop_aligned,
            ..Default::default()
        }
    }
}

/// Build a combined land/ocean centroid grid.
///
/// Land points inside the land buffer and ocean points outside it are kept.
/// Land points carry `on_land` from the narrower on-land buffer and ocean
/// points are never on land. The result is cropped to `params.bounds`.
pub fn make_base_centroids(
    params: &CentroidGridParams,
    land: &LandMask,
    regions: Option<&RegionIndex>,
) -> Result<Centroids> {
    if params.on_land_buffer > params.land_buffer {
        return Err(HazardError::invalid_parameters(format!(
            "on-land buffer {} exceeds land buffer {}",
            params.on_land_buffer, params.land_buffer
        )));
    }
    let res_land = params.res_land_arcsec / 3600.0;
    let res_ocean = params.res_ocean_arcsec / 3600.0;

    let land_bounds = if params.litpop_aligned {
        let half = res_land / 2.0;
        BoundingBox::new(-180.0 + half, -90.0 + half, 180.0 - half, 90.0 - half)
    } else {
        params.bounds
    };
    let cent_land = Centroids::from_pnt_bounds(&land_bounds, res_land)?;
    let cent_ocean = Centroids::from_pnt_bounds(&params.bounds, res_ocean)?;
    info!(
        land_candidates = cent_land.len(),
        ocean_candidates = cent_ocean.len(),
        litpop_aligned = params.litpop_aligned,
        "Classifying centroid candidates"
    );

    let ocean_keep: Vec<bool> = land.mask(&cent_ocean, params.land_buffer).into_iter().map(|m| !m).collect();
    let mut cent_ocean = cent_ocean.select_mask(&ocean_keep)?;
    cent_ocean.on_land = Some(vec![false; cent_ocean.len()]);

    let mut cent_land = cent_land.select_mask(&land.mask(&cent_land, params.land_buffer))?;
    cent_land.on_land = Some(land.mask(&cent_land, params.on_land_buffer));

    let mut cent = cent_land;
    cent.append(&cent_ocean)?;

    if let Some(regions) = regions {
        regions.assign(&mut cent);
    }
    let cent = cent.select_extent(&params.bounds)?;

    info!(centroids = cent.len(), "Built centroid grid");
    Ok(cent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"ISO_N3": "756"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-2.0, -2.0], [2.0, -2.0], [2.0, 2.0], [-2.0, 2.0], [-2.0, -2.0]]]
            }
        }]
    }"#;

    #[test]
    fn test_contains_buffered() {
        let land = LandMask::from_geojson_str(SQUARE).unwrap();
        assert_eq!(land.len(), 1);
        assert!(land.contains_buffered(0.0, 0.0, 0.0));
        assert!(!land.contains_buffered(2.05, 0.0, 0.0));
        assert!(land.contains_buffered(2.05, 0.0, 0.1));
        assert!(!land.contains_buffered(2.05, 0.0, 0.02));
    }

    #[test]
    fn test_region_lookup() {
        let regions = RegionIndex::from_geojson_str(SQUARE).unwrap();
        assert_eq!(regions.region_of(1.0, 1.0), 756);
        assert_eq!(regions.region_of(10.0, 1.0), 0);
    }

    #[test]
    fn test_unclosed_ring_is_rejected() {
        let open = r#"{"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]}"#;
        assert!(matches!(LandMask::from_geojson_str(open), Err(HazardError::Geometry(_))));
    }

    #[test]
    fn test_make_base_centroids() {
        let land = LandMask::from_geojson_str(SQUARE).unwrap();
        let regions = RegionIndex::from_geojson_str(SQUARE).unwrap();
        let params = CentroidGridParams {
            bounds: BoundingBox::new(-5.0, -5.0, 5.0, 5.0),
            res_land_arcsec: 3600.0,
            res_ocean_arcsec: 7200.0,
            ..Default::default()
        };
        let cent = make_base_centroids(&params, &land, Some(&regions)).unwrap();

        // 5x5 land points on the square, 6x6 ocean points minus the 2x2 near land.
        assert_eq!(cent.len(), 25 + 32);
        let on_land = cent.on_land.as_ref().unwrap();
        assert_eq!(on_land.iter().filter(|&&b| b).count(), 25);
        let region = cent.region_id.as_ref().unwrap();
        assert_eq!(region[12], 756);
        assert_eq!(region[30], 0);
    }

    #[test]
    fn test_variant_file_names() {
        let names: Vec<String> = CentroidVariant::all().iter().map(|v| v.file_name()).collect();
        assert_eq!(
            names[0],
            "earth_centroids_150asland_1800asoceans_distcoast_region_nopoles_litpop_aligned_.json"
        );
        assert_eq!(names[3], "earth_centroids_150asland_1800asoceans_distcoast_region_.json");
        assert_eq!(CentroidVariant::all()[1].bounds().min_y, -90.0);
    }
}
