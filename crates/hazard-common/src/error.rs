//! Error types shared by the hazard preparation crates.

use thiserror::Error;

/// Result type alias using HazardPrepError.
pub type HazardPrepResult<T> = Result<T, HazardPrepError>;

/// Errors raised by the common building blocks.
#[derive(Debug, Error)]
pub enum HazardPrepError {
    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid extent: {0}")]
    InvalidExtent(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for HazardPrepError {
    fn from(err: std::io::Error) -> Self {
        HazardPrepError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HazardPrepError {
    fn from(err: serde_json::Error) -> Self {
        HazardPrepError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<crate::crs::CrsParseError> for HazardPrepError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        HazardPrepError::InvalidCrs(err.to_string())
    }
}

impl From<crate::bbox::BboxParseError> for HazardPrepError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        HazardPrepError::InvalidExtent(err.to_string())
    }
}
