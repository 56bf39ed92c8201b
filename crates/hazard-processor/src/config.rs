//! Configuration for the hazard processor.

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregationMethod, AggregationParams};

/// Defaults applied to aggregation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Target cell size in units of the original CRS.
    pub default_cell_size: f64,

    /// Reduction applied per target cell.
    pub default_method: AggregationMethod,

    /// Treat zero intensity as missing.
    pub treat_zeros_as_nans: bool,

    /// Run independent resolutions in parallel.
    pub parallel: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            default_cell_size: 2000.0,
            default_method: AggregationMethod::Max,
            treat_zeros_as_nans: true,
            parallel: true,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HAZARD_CELL_SIZE") {
            if let Ok(size) = val.parse() {
                config.default_cell_size = size;
            }
        }

        if let Ok(val) = std::env::var("HAZARD_AGG_METHOD") {
            if let Some(method) = AggregationMethod::parse(&val) {
                config.default_method = method;
            }
        }

        if let Ok(val) = std::env::var("HAZARD_ZEROS_AS_NANS") {
            config.treat_zeros_as_nans = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("HAZARD_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_cell_size.is_finite() && self.default_cell_size > 0.0) {
            return Err("default_cell_size must be > 0".to_string());
        }

        if self.default_method == AggregationMethod::Max && !self.treat_zeros_as_nans {
            return Err("max aggregation requires treat_zeros_as_nans".to_string());
        }

        Ok(())
    }

    /// Aggregation parameters for the configured defaults.
    pub fn aggregation_params(&self) -> AggregationParams {
        AggregationParams {
            cell_size: self.default_cell_size,
            method: self.default_method,
            treat_zeros_as_nans: self.treat_zeros_as_nans,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.default_cell_size, 2000.0);
        assert_eq!(config.default_method, AggregationMethod::Max);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("HAZARD_CELL_SIZE", "8000");
        std::env::set_var("HAZARD_AGG_METHOD", "mean");
        let config = ProcessorConfig::from_env();
        std::env::remove_var("HAZARD_CELL_SIZE");
        std::env::remove_var("HAZARD_AGG_METHOD");

        assert_eq!(config.default_cell_size, 8000.0);
        assert_eq!(config.default_method, AggregationMethod::Mean);
        assert_eq!(config.aggregation_params().cell_size, 8000.0);
    }

    #[test]
    fn test_validation() {
        let mut config = ProcessorConfig::default();
        config.default_cell_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.treat_zeros_as_nans = false;
        assert!(config.validate().is_err());
        config.default_method = AggregationMethod::Mean;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aggregation_params() {
        let config = ProcessorConfig {
            default_cell_size: 4000.0,
            default_method: AggregationMethod::Sum,
            treat_zeros_as_nans: false,
            parallel: false,
        };
        let params = config.aggregation_params();
        assert_eq!(params.cell_size, 4000.0);
        assert_eq!(params.method, AggregationMethod::Sum);
        assert!(!params.treat_zeros_as_nans);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProcessorConfig = serde_json::from_str(r#"{"default_method": "mean"}"#).unwrap();
        assert_eq!(config.default_method, AggregationMethod::Mean);
        assert!(config.treat_zeros_as_nans);
    }
}
