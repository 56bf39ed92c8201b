//! Centroids: the points at which hazard intensity is recorded.

use hazard_common::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};

/// A set of hazard centroids.
///
/// `lon`/`lat` hold x/y in the centroid CRS, so for projected CRSs they
/// are easting and northing in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroids {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub crs: CrsCode,
    /// Numeric region (country) id per centroid, 0 when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<Vec<i32>>,
    /// Land/ocean flag per centroid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_land: Option<Vec<bool>>,
}

impl Centroids {
    /// Create centroids from parallel latitude/longitude vectors.
    pub fn from_lat_lon(lat: Vec<f64>, lon: Vec<f64>, crs: CrsCode) -> Result<Self> {
        if lat.len() != lon.len() {
            return Err(HazardError::invalid_hazard(format!(
                "centroids have {} latitudes but {} longitudes",
                lat.len(),
                lon.len()
            )));
        }
        Ok(Self {
            lat,
            lon,
            crs,
            region_id: None,
            on_land: None,
        })
    }

    /// Create centroids from `(x, y)` points.
    pub fn from_xy(points: &[(f64, f64)], crs: CrsCode) -> Self {
        Self {
            lon: points.iter().map(|p| p.0).collect(),
            lat: points.iter().map(|p| p.1).collect(),
            crs,
            region_id: None,
            on_land: None,
        }
    }

    /// Regular point grid covering `bounds` with spacing `res`.
    ///
    /// Rows run north to south and columns west to east; both bounds are
    /// included as point positions.
    pub fn from_pnt_bounds(bounds: &BoundingBox, res: f64) -> Result<Self> {
        if !(res.is_finite() && res > 0.0) {
            return Err(HazardError::invalid_parameters(format!(
                "point resolution must be positive, got {}",
                res
            )));
        }
        if bounds.width() < 0.0 || bounds.height() < 0.0 {
            return Err(HazardError::invalid_parameters(format!("inverted bounds {:?}", bounds)));
        }

        let ncols = (bounds.width() / res).round() as usize + 1;
        let nrows = (bounds.height() / res).round() as usize + 1;

        let mut lat = Vec::with_capacity(nrows * ncols);
        let mut lon = Vec::with_capacity(nrows * ncols);
        for row in 0..nrows {
            let y = bounds.max_y - row as f64 * res;
            for col in 0..ncols {
                lat.push(y);
                lon.push(bounds.min_x + col as f64 * res);
            }
        }
        Self::from_lat_lon(lat, lon, CrsCode::Epsg4326)
    }

    /// Number of centroids.
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    /// Check if there are no centroids.
    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    /// Coordinates as `(x, y)` pairs in the centroid CRS.
    pub fn coords(&self) -> Vec<(f64, f64)> {
        self.lon.iter().copied().zip(self.lat.iter().copied()).collect()
    }

    /// Coordinates transformed into another CRS.
    pub fn coords_in(&self, crs: CrsCode) -> Result<Vec<(f64, f64)>> {
        let mut points = self.coords();
        projection::transform_points(self.crs, crs, &mut points)?;
        Ok(points)
    }

    /// Mask of centroids inside `extent` (edges inclusive).
    pub fn extent_mask(&self, extent: &BoundingBox) -> Vec<bool> {
        self.lon
            .iter()
            .zip(&self.lat)
            .map(|(&x, &y)| extent.contains_point(x, y))
            .collect()
    }

    /// Keep the centroids at `indices`, in that order.
    pub fn select_indices(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(HazardError::invalid_parameters(format!(
                "centroid index {} out of range for {} centroids",
                bad,
                self.len()
            )));
        }
        let pick = |v: &Vec<f64>| indices.iter().map(|&i| v[i]).collect::<Vec<_>>();
        Ok(Self {
            lat: pick(&self.lat),
            lon: pick(&self.lon),
            crs: self.crs,
            region_id: self
                .region_id
                .as_ref()
                .map(|r| indices.iter().map(|&i| r[i]).collect()),
            on_land: self
                .on_land
                .as_ref()
                .map(|o| indices.iter().map(|&i| o[i]).collect()),
        })
    }

    /// Keep the centroids where `mask` is true.
    pub fn select_mask(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(HazardError::invalid_parameters(format!(
                "mask has {} entries for {} centroids",
                mask.len(),
                self.len()
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.select_indices(&indices)
    }

    /// Keep the centroids inside `extent`.
    pub fn select_extent(&self, extent: &BoundingBox) -> Result<Self> {
        self.select_mask(&self.extent_mask(extent))
    }

    /// Append another set of centroids in the same CRS.
    ///
    /// Optional attributes survive when at least one side carries them;
    /// the other side is filled with 0 / `false`.
    pub fn append(&mut self, other: &Centroids) -> Result<()> {
        if self.crs != other.crs {
            return Err(HazardError::incompatible(format!(
                "cannot append centroids in {} to centroids in {}",
                other.crs, self.crs
            )));
        }

        let (n_self, n_other) = (self.len(), other.len());
        self.region_id = merge_attr(self.region_id.take(), other.region_id.as_ref(), n_self, n_other, 0);
        self.on_land = merge_attr(self.on_land.take(), other.on_land.as_ref(), n_self, n_other, false);
        self.lat.extend_from_slice(&other.lat);
        self.lon.extend_from_slice(&other.lon);
        Ok(())
    }

    /// Bounding box of all centroids, `None` if empty.
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        let fold = |v: &[f64]| {
            v.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
        };
        let (min_x, max_x) = fold(&self.lon);
        let (min_y, max_y) = fold(&self.lat);
        Some(BoundingBox::new(min_x, min_y, max_x, max_y))
    }
}

fn merge_attr<T: Clone>(
    mine: Option<Vec<T>>,
    theirs: Option<&Vec<T>>,
    n_mine: usize,
    n_theirs: usize,
    fill: T,
) -> Option<Vec<T>> {
    match (mine, theirs) {
        (None, None) => None,
        (mine, theirs) => {
            let mut merged = mine.unwrap_or_else(|| vec![fill.clone(); n_mine]);
            match theirs {
                Some(t) => merged.extend_from_slice(t),
                None => merged.extend(std::iter::repeat(fill).take(n_theirs)),
            }
            Some(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pnt_bounds_order() {
        let c = Centroids::from_pnt_bounds(&BoundingBox::new(0.0, 0.0, 2.0, 1.0), 1.0).unwrap();
        assert_eq!(c.len(), 6);
        // First row is the northern edge, west to east.
        assert_eq!((c.lon[0], c.lat[0]), (0.0, 1.0));
        assert_eq!((c.lon[2], c.lat[2]), (2.0, 1.0));
        assert_eq!((c.lon[3], c.lat[3]), (0.0, 0.0));
    }

    #[test]
    fn test_from_pnt_bounds_rejects_bad_resolution() {
        assert!(Centroids::from_pnt_bounds(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.0).is_err());
    }

    #[test]
    fn test_select_extent_keeps_attributes() {
        let mut c = Centroids::from_lat_lon(vec![46.0, 47.0, 48.0], vec![7.0, 8.0, 9.0], CrsCode::Epsg4326).unwrap();
        c.region_id = Some(vec![756, 756, 276]);
        let sel = c.select_extent(&BoundingBox::new(6.5, 45.5, 8.5, 47.5)).unwrap();
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.region_id, Some(vec![756, 756]));
        assert!(sel.on_land.is_none());
    }

    #[test]
    fn test_append_fills_missing_attributes() {
        let mut a = Centroids::from_lat_lon(vec![1.0], vec![1.0], CrsCode::Epsg4326).unwrap();
        a.on_land = Some(vec![true]);
        let b = Centroids::from_lat_lon(vec![2.0, 3.0], vec![2.0, 3.0], CrsCode::Epsg4326).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.on_land, Some(vec![true, false, false]));
        assert!(a.region_id.is_none());
    }

    #[test]
    fn test_append_rejects_crs_mismatch() {
        let mut a = Centroids::from_lat_lon(vec![1.0], vec![1.0], CrsCode::Epsg4326).unwrap();
        let b = Centroids::from_lat_lon(vec![1.0], vec![1.0], CrsCode::Epsg2056).unwrap();
        assert!(a.append(&b).is_err());
    }

    #[test]
    fn test_coords_in_lv95() {
        let c = Centroids::from_lat_lon(vec![46.95], vec![7.44], CrsCode::Epsg4326).unwrap();
        let pts = c.coords_in(CrsCode::Epsg2056).unwrap();
        assert!((pts[0].0 - 2_600_000.0).abs() < 2_000.0);
        assert!((pts[0].1 - 1_200_000.0).abs() < 2_000.0);
    }
}
