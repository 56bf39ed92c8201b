//! Run configuration for the batch jobs.
//!
//! An aggregation run is described by one YAML file. Values may reference
//! environment variables with `${VAR}` or `${VAR:-default}`, so the same
//! file can be used on a laptop and on the cluster.

use anyhow::{Context, Result};
use hazard_common::{time::parse_date_ordinal, BoundingBox, CrsCode};
use hazard_processor::{AggregationMethod, AggregationParams, ProcessorConfig};
use radar_netcdf::RadarOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Aggregation run (aggregate.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving every output of the run
    pub output_dir: PathBuf,
    /// Leading part of the aggregated hazard file names
    pub output_prefix: String,
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub raster: Option<RasterConfig>,
}

/// Where the fine-grid hazard comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// A hazard file written by `save_hazard`
    Hazard { path: PathBuf },
    /// Yearly radar NetCDF archives
    Radar(RadarSourceConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarSourceConfig {
    pub dir: PathBuf,
    /// File name with a `{year}` placeholder, e.g. `MZC_X1d66_{year}.nc`
    pub file_template: String,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub options: RadarOptions,
    /// Also save the fine-grid hazard before aggregating
    #[serde(default)]
    pub save_source: bool,
}

impl RadarSourceConfig {
    /// One path per year, in year order.
    pub fn files(&self) -> Vec<PathBuf> {
        (self.start_year..=self.end_year)
            .map(|year| self.dir.join(self.file_template.replace("{year}", &year.to_string())))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Target resolutions in km
    pub kms: Vec<u32>,
    pub method: AggregationMethod,
    pub original_crs: CrsCode,
    pub output_crs: CrsCode,
    pub treat_zeros_as_nans: bool,
    pub extent: Option<BoundingBox>,
    /// Run the resolutions in parallel
    pub parallel: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::from_processor_config(&ProcessorConfig::from_env())
    }
}

impl AggregationConfig {
    /// Defaults taken from the processor configuration.
    pub fn from_processor_config(config: &ProcessorConfig) -> Self {
        Self {
            kms: vec![1, 2, 4, 8, 16, 32],
            method: config.default_method,
            original_crs: CrsCode::Epsg2056,
            output_crs: CrsCode::Epsg4326,
            treat_zeros_as_nans: config.treat_zeros_as_nans,
            extent: None,
            parallel: config.parallel,
        }
    }

    /// Processor settings of this run at resolution `km`.
    pub fn processor_config(&self, km: u32) -> ProcessorConfig {
        ProcessorConfig {
            default_cell_size: f64::from(km) * 1000.0,
            default_method: self.method,
            treat_zeros_as_nans: self.treat_zeros_as_nans,
            parallel: self.parallel,
        }
    }

    /// Aggregation parameters for one resolution.
    pub fn params_for(&self, km: u32, raster_dates: Option<Vec<i64>>) -> AggregationParams {
        AggregationParams {
            original_crs: self.original_crs,
            extent: self.extent,
            cell_size: f64::from(km) * 1000.0,
            output_crs: self.output_crs,
            method: self.method,
            treat_zeros_as_nans: self.treat_zeros_as_nans,
            return_raster: raster_dates.is_some(),
            raster_dates,
        }
    }
}

/// Event rasters written next to the aggregated hazards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Event dates, `YYYY-MM-DD` or `DD-MM-YYYY`
    pub dates: Vec<String>,
    /// Leading part of the raster file names
    pub prefix: String,
    /// Name of the raster variable; defaults to the radar variable
    #[serde(default)]
    pub variable: Option<String>,
}

impl RasterConfig {
    /// Dates as ordinals.
    pub fn ordinals(&self) -> Result<Vec<i64>> {
        self.dates
            .iter()
            .map(|d| parse_date_ordinal(d).with_context(|| format!("Invalid raster date {}", d)))
            .collect()
    }
}

/// Load and validate a run configuration.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read run config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let config: RunConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse run config from {:?}", path.as_ref()))?;

    validate_run_config(&config)?;

    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_run_config(config: &RunConfig) -> Result<()> {
    anyhow::ensure!(!config.output_prefix.is_empty(), "output_prefix cannot be empty");

    let agg = &config.aggregation;
    anyhow::ensure!(!agg.kms.is_empty(), "At least one resolution is required in aggregation.kms");
    anyhow::ensure!(
        agg.kms.iter().all(|&km| km > 0),
        "Resolutions must be positive, got {:?}",
        agg.kms
    );
    for &km in &agg.kms {
        agg.processor_config(km)
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid aggregation at {} km: {}", km, e))?;
    }
    anyhow::ensure!(
        agg.original_crs == CrsCode::Epsg2056 || agg.extent.is_some(),
        "An extent is required for original CRS {}",
        agg.original_crs
    );

    if let SourceConfig::Radar(radar) = &config.source {
        anyhow::ensure!(
            radar.start_year <= radar.end_year,
            "start_year {} is after end_year {}",
            radar.start_year,
            radar.end_year
        );
        anyhow::ensure!(
            radar.file_template.contains("{year}"),
            "file_template must contain {{year}}: {}",
            radar.file_template
        );
    }

    if let Some(raster) = &config.raster {
        raster.ordinals()?;
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MESHS_RUN: &str = r#"
output_dir: ${HAZARD_PREP_TEST_DATA:-/tmp/hazard}/MZC
output_prefix: MZC_2017_2021
source:
  radar:
    dir: /data/radar/MZC
    file_template: MZC_X1d66_{year}.nc
    start_year: 2017
    end_year: 2021
    options:
      varname: MESHS
aggregation:
  kms: [1, 2, 4]
  method: max
raster:
  prefix: MZC_12_events_2017_2021
  dates: ["2017-06-27", "30-06-2019"]
"#;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("HAZARD_PREP_TEST_VAR", "test_value");
        let result = expand_env_vars("prefix_${HAZARD_PREP_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("HAZARD_PREP_NONEXISTENT");
        let result = expand_env_vars("value_${HAZARD_PREP_NONEXISTENT:-default}_end").unwrap();
        assert_eq!(result, "value_default_end");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("HAZARD_PREP_REQUIRED");
        assert!(expand_env_vars("${HAZARD_PREP_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_resolve_var_expr_override_default() {
        std::env::set_var("HAZARD_PREP_SET_VAR", "custom");
        assert_eq!(resolve_var_expr("HAZARD_PREP_SET_VAR:-default").unwrap(), "custom");
    }

    #[test]
    fn test_parse_radar_run() {
        let yaml = expand_env_vars(MESHS_RUN).unwrap();
        let config: RunConfig = serde_yaml::from_str(&yaml).unwrap();
        validate_run_config(&config).unwrap();

        let SourceConfig::Radar(radar) = &config.source else {
            panic!("expected a radar source");
        };
        let files = radar.files();
        assert_eq!(files.len(), 5);
        assert_eq!(files[0], PathBuf::from("/data/radar/MZC/MZC_X1d66_2017.nc"));
        assert_eq!(radar.options.varname, "MESHS");

        // Unset keys fall back to defaults.
        assert_eq!(config.aggregation.original_crs, CrsCode::Epsg2056);
        assert!(config.aggregation.treat_zeros_as_nans);

        let raster = config.raster.as_ref().unwrap();
        let ordinals = raster.ordinals().unwrap();
        assert_eq!(ordinals[1] - ordinals[0], 733);
    }

    #[test]
    fn test_defaults_follow_environment() {
        std::env::set_var("HAZARD_PARALLEL", "false");
        assert!(!AggregationConfig::default().parallel);
        std::env::remove_var("HAZARD_PARALLEL");
        assert!(AggregationConfig::default().parallel);
    }

    #[test]
    fn test_params_for_resolution() {
        let agg = AggregationConfig::default();
        let params = agg.params_for(4, Some(vec![737_969]));
        assert_eq!(params.cell_size, 4000.0);
        assert!(params.return_raster);
        assert!(!agg.params_for(1, None).return_raster);
    }

    #[test]
    fn test_validation_rejects_bad_runs() {
        let yaml = expand_env_vars(MESHS_RUN).unwrap();
        let base: RunConfig = serde_yaml::from_str(&yaml).unwrap();

        let mut slow_max = base.clone();
        slow_max.aggregation.treat_zeros_as_nans = false;
        assert!(validate_run_config(&slow_max).is_err());

        let mut no_extent = base.clone();
        no_extent.aggregation.original_crs = CrsCode::Epsg3857;
        assert!(validate_run_config(&no_extent).is_err());

        let mut no_kms = base.clone();
        no_kms.aggregation.kms.clear();
        assert!(validate_run_config(&no_kms).is_err());

        let mut bad_date = base;
        if let Some(raster) = bad_date.raster.as_mut() {
            raster.dates.push("June 28".into());
        }
        assert!(validate_run_config(&bad_date).is_err());
    }

    #[test]
    fn test_shipped_configs_are_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        for name in ["aggregate.yaml", "aggregate_poh.yaml"] {
            let config = load_run_config(dir.join(name)).unwrap();
            assert_eq!(config.aggregation.kms, vec![1, 2, 4, 8, 16, 32]);
        }
    }

    #[test]
    fn test_load_run_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregate.yaml");
        std::fs::write(
            &path,
            "output_dir: out\noutput_prefix: HL\nsource:\n  hazard:\n    path: haz.json.gz\n",
        )
        .unwrap();
        let config = load_run_config(&path).unwrap();
        assert!(matches!(config.source, SourceConfig::Hazard { .. }));
        assert!(config.raster.is_none());
        assert_eq!(config.aggregation.kms, vec![1, 2, 4, 8, 16, 32]);
    }
}
