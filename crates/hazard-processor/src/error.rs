//! Error types for hazard processing.

use hazard_common::HazardPrepError;
use thiserror::Error;

/// Errors that can occur while building, aggregating or storing hazards.
#[derive(Error, Debug)]
pub enum HazardError {
    /// The hazard violates a structural invariant.
    #[error("invalid hazard: {0}")]
    InvalidHazard(String),

    /// Aggregation or grid parameters are unusable.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Hazards cannot be combined.
    #[error("incompatible hazards: {0}")]
    Incompatible(String),

    /// Nothing to operate on.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Sparse matrix assembly failed.
    #[error("sparse matrix error: {0}")]
    Sparse(String),

    /// Projection error.
    #[error("projection error: {0}")]
    Projection(String),

    /// Geometry input could not be used.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error from the common building blocks.
    #[error(transparent)]
    Common(#[from] HazardPrepError),
}

impl HazardError {
    /// Create an InvalidHazard error.
    pub fn invalid_hazard(msg: impl Into<String>) -> Self {
        Self::InvalidHazard(msg.into())
    }

    /// Create an InvalidParameters error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create an Incompatible error.
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::Incompatible(msg.into())
    }
}

impl From<std::io::Error> for HazardError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for HazardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<projection::ProjectionError> for HazardError {
    fn from(err: projection::ProjectionError) -> Self {
        Self::Projection(err.to_string())
    }
}

impl From<nalgebra_sparse::SparseFormatError> for HazardError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        Self::Sparse(err.to_string())
    }
}

/// Result type for hazard processor operations.
pub type Result<T> = std::result::Result<T, HazardError>;
