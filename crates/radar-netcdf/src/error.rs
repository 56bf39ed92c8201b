//! Error types for radar stack handling.

use hazard_common::HazardPrepError;
use hazard_processor::HazardError;
use thiserror::Error;

/// Result type for radar operations.
pub type RadarResult<T> = Result<T, RadarError>;

/// Error types for radar stacks and NetCDF access.
#[derive(Error, Debug)]
pub enum RadarError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// The requested radar variable is not in the catalogue
    #[error("varname \"{0}\" is not implemented")]
    UnknownVariable(String),

    /// Conflicting or incomplete options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Hazard construction failed
    #[error(transparent)]
    Hazard(#[from] HazardError),

    /// NetCDF support was not compiled in
    #[error("NetCDF support is disabled, rebuild with the `native` feature")]
    NativeDisabled,
}

impl From<HazardPrepError> for RadarError {
    fn from(err: HazardPrepError) -> Self {
        Self::Hazard(HazardError::from(err))
    }
}
