//! Concatenation of basin-wise tropical cyclone hazards into global files.
//!
//! Basin files live under
//! `{input_dir}/{basin}/{scenario}/{year}/` (or `{input_dir}/{basin}/historical/`
//! for the historical period) and are merged in basin order, `NI` first.
//! The global file is written to `{output_dir}/global/{scenario}/{year}/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hazard_processor::{concat_hazards, load_hazard, save_hazard};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Genesis basins merged by default.
pub const DEFAULT_BASINS: [&str; 5] = ["EP", "WP", "SP", "NI", "SI"];

/// Basin whose events keep their original ids.
const BASE_BASIN: &str = "NI";

const HISTORICAL: &str = "historical";

/// One concatenation job over every scenario × year combination.
#[derive(Debug, Clone)]
pub struct ConcatJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub n_tracks: u32,
    pub basins: Vec<String>,
    pub scenarios: Vec<String>,
    pub years: Vec<String>,
}

/// Hazard file name of one basin, or of the global set for `basin = "global"`.
pub fn tc_file_name(n_tracks: u32, basin: &str, scenario: &str, year: &str) -> String {
    format!(
        "tropical_cyclone_{}synth_tracks_150arcsec_genesis_{}_{}_{}.json.gz",
        n_tracks, basin, scenario, year
    )
}

/// Basins in merge order.
pub fn ordered_basins(basins: &[String]) -> Vec<&str> {
    let mut ordered: Vec<&str> = basins.iter().map(String::as_str).filter(|b| *b == BASE_BASIN).collect();
    ordered.extend(basins.iter().map(String::as_str).filter(|b| *b != BASE_BASIN));
    ordered
}

/// Run every scenario × year combination and return the written files.
pub fn run_concat(job: &ConcatJob) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(!job.basins.is_empty(), "No basins to concatenate");

    let mut written = Vec::new();
    for scenario in &job.scenarios {
        for year in &job.years {
            written.push(concat_scenario_year(job, scenario, year)?);
        }
    }
    Ok(written)
}

fn concat_scenario_year(job: &ConcatJob, scenario: &str, year: &str) -> Result<PathBuf> {
    info!(scenario, year, basins = ?job.basins, "Concatenating basins");

    let parts = ordered_basins(&job.basins)
        .into_iter()
        .map(|basin| {
            let path = basin_file(job, basin, scenario, year)?;
            debug!(basin, path = %path.display(), "Reading basin hazard");
            load_hazard(&path).with_context(|| format!("Failed to read {} hazard {:?}", basin, path))
        })
        .collect::<Result<Vec<_>>>()?;

    let global = concat_hazards(parts).with_context(|| format!("Failed to merge basins for {} {}", scenario, year))?;

    let path = job
        .output_dir
        .join("global")
        .join(scenario)
        .join(year)
        .join(tc_file_name(job.n_tracks, "global", scenario, year));
    save_hazard(&path, &global)?;

    info!(
        scenario,
        year,
        events = global.n_events(),
        path = %path.display(),
        "Finished concatenating basins"
    );
    Ok(path)
}

fn basin_file(job: &ConcatJob, basin: &str, scenario: &str, year: &str) -> Result<PathBuf> {
    let name = tc_file_name(job.n_tracks, basin, scenario, year);
    if scenario == HISTORICAL {
        return Ok(job.input_dir.join(basin).join(HISTORICAL).join(name));
    }
    let dir = job.input_dir.join(basin).join(scenario).join(year);
    ensure_single_file(&dir)?;
    Ok(dir.join(name))
}

/// Scenario/year directories hold exactly one hazard.
fn ensure_single_file(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    anyhow::ensure!(files <= 1, "Multiple files found in {:?}", dir);
    Ok(())
}
