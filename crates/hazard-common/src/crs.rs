//! Coordinate Reference System codes.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CRS codes the hazard pipeline knows how to transform between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Swiss CH1903+ / LV95 (meters)
    Epsg2056,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Look up a CRS by its EPSG number.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            2056 => Ok(CrsCode::Epsg2056),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            other => Err(CrsParseError::UnsupportedCrs(other.to_string())),
        }
    }

    /// Parse a CRS string.
    ///
    /// Accepts "EPSG:2056", "epsg:4326" or a bare EPSG number.
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(code)
    }

    /// The EPSG number of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg2056 => 2056,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Predefined grid extent for CRSs that have one.
    ///
    /// LV95 grids always cover the Swiss national extent used by MeteoSwiss
    /// radar composites.
    pub fn default_extent(&self) -> Option<BoundingBox> {
        match self {
            CrsCode::Epsg2056 => Some(BoundingBox::new(2255000.0, 840000.0, 2964000.0, 1479000.0)),
            _ => None,
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<u32> for CrsCode {
    type Error = CrsParseError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_epsg(code)
    }
}

impl From<CrsCode> for u32 {
    fn from(code: CrsCode) -> Self {
        code.epsg()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
