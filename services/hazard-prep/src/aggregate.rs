//! Aggregation job: one fine-grid hazard, several target resolutions.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use hazard_processor::{
    aggregate_hazard, load_hazard, save_hazard, save_raster, AggregationMethod, EventRaster, Hazard,
};
use radar_netcdf::{hazard_from_radar, read_radar_files, VariableSpec};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{RadarSourceConfig, RunConfig, SourceConfig};

/// Files written by one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionOutput {
    pub km: u32,
    pub hazard_path: PathBuf,
    pub raster_path: Option<PathBuf>,
}

/// Load the source hazard, aggregate it to every configured resolution and
/// save the results.
pub fn run_aggregate(config: &RunConfig) -> Result<Vec<ResolutionOutput>> {
    let started = Instant::now();
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", config.output_dir))?;

    let (hazard, variable) = load_source(config)?;
    let outputs = run_aggregate_hazard(config, &hazard, &variable)?;
    info!(
        resolutions = outputs.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Aggregation run finished"
    );
    Ok(outputs)
}

/// Aggregate an already loaded hazard. `variable` names the raster variable
/// unless the configuration overrides it.
pub fn run_aggregate_hazard(config: &RunConfig, hazard: &Hazard, variable: &str) -> Result<Vec<ResolutionOutput>> {
    let raster_dates = config.raster.as_ref().map(|r| r.ordinals()).transpose()?;
    let raster_variable = config
        .raster
        .as_ref()
        .and_then(|r| r.variable.clone())
        .unwrap_or_else(|| variable.to_string());

    let run_one = |km: u32| -> Result<ResolutionOutput> {
        let started = Instant::now();
        let method = config.aggregation.method;
        let params = config.aggregation.params_for(km, raster_dates.clone());
        let output = aggregate_hazard(hazard, &params).with_context(|| format!("Aggregation to {} km failed", km))?;

        let hazard_path = config
            .output_dir
            .join(output_file_name(&config.output_prefix, method, km, "json.gz"));
        save_hazard(&hazard_path, &output.hazard)?;

        let raster_path = match (output.raster, &config.raster) {
            (Some(raster), Some(raster_config)) => {
                let raster = raster.rename(raster_variable.as_str());
                let name = |extension: &str| output_file_name(&raster_config.prefix, method, km, extension);
                Some(write_raster(&config.output_dir, name, &raster)?)
            }
            _ => None,
        };

        info!(
            km,
            cells = output.grid.len(),
            nnz = output.hazard.intensity.nnz(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregated resolution"
        );
        Ok(ResolutionOutput {
            km,
            hazard_path,
            raster_path,
        })
    };

    let kms = &config.aggregation.kms;
    if config.aggregation.parallel {
        kms.par_iter().map(|&km| run_one(km)).collect()
    } else {
        kms.iter().map(|&km| run_one(km)).collect()
    }
}

/// `{prefix}_{method}_{km}km.{extension}`
pub fn output_file_name(prefix: &str, method: AggregationMethod, km: u32, extension: &str) -> String {
    format!("{}_{}_{}km.{}", prefix, method, km, extension)
}

fn load_source(config: &RunConfig) -> Result<(Hazard, String)> {
    match &config.source {
        SourceConfig::Hazard { path } => {
            let hazard = load_hazard(path).with_context(|| format!("Failed to load hazard {:?}", path))?;
            let variable = hazard.haz_type.clone();
            Ok((hazard, variable))
        }
        SourceConfig::Radar(radar) => load_radar(config, radar),
    }
}

fn load_radar(config: &RunConfig, radar: &RadarSourceConfig) -> Result<(Hazard, String)> {
    let spec = VariableSpec::lookup(&radar.options.varname)?;
    let files = radar.files();
    info!(
        varname = %spec.name,
        nc_name = %spec.nc_name,
        files = files.len(),
        "Reading radar archive"
    );

    let stack = read_radar_files(&files, &[spec.nc_name.as_str()])
        .with_context(|| format!("Failed to read radar files in {:?}", radar.dir))?;
    let hazard = hazard_from_radar(&stack, &radar.options)?;

    if radar.save_source {
        let path = config.output_dir.join(format!("{}_source.json.gz", config.output_prefix));
        save_hazard(&path, &hazard)?;
    }
    Ok((hazard, spec.nc_name))
}

/// Write rasters as NetCDF when available, JSON otherwise.
fn write_raster(dir: &Path, name: impl Fn(&str) -> String, raster: &EventRaster) -> Result<PathBuf> {
    if radar_netcdf::native_enabled() {
        let path = dir.join(name("nc"));
        radar_netcdf::write_event_raster(&path, raster)?;
        Ok(path)
    } else {
        warn!(variable = %raster.variable, "NetCDF support not compiled in, writing raster as JSON");
        let path = dir.join(name("json.gz"));
        save_raster(&path, raster)?;
        Ok(path)
    }
}
