//! Hazard preparation batch jobs.
//!
//! Regrids hail hazards onto coarser grids, merges basin-wise tropical
//! cyclone hazards and generates global centroid sets.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hazard_prep::aggregate::run_aggregate;
use hazard_prep::centroids::{run_centroids, run_dir_name};
use hazard_prep::concat::{run_concat, ConcatJob};
use hazard_prep::config::load_run_config;

#[derive(Parser, Debug)]
#[command(name = "hazard-prep")]
#[command(about = "Prepare hazard and centroid files for risk modelling")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a hazard onto coarser grids
    Aggregate {
        /// Run configuration file
        #[arg(short, long, default_value = "config/aggregate.yaml", env = "HAZARD_PREP_CONFIG")]
        config: PathBuf,
    },

    /// Merge basin-wise tropical cyclone hazards into global files
    Concat {
        /// Directory holding one sub-directory per basin
        #[arg(long)]
        input_dir: PathBuf,

        /// Output directory (default: input directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of synthetic tracks per historical track
        #[arg(long, default_value_t = 10)]
        n_tracks: u32,

        /// Comma-separated basins
        #[arg(long, value_delimiter = ',', default_value = "EP,WP,SP,NI,SI")]
        basins: Vec<String>,

        /// Comma-separated climate scenarios
        #[arg(long, value_delimiter = ',', default_value = "rcp85")]
        scenario: Vec<String>,

        /// Comma-separated target years
        #[arg(long, value_delimiter = ',', default_value = "2040,2060,2080")]
        year: Vec<String>,
    },

    /// Build the four global centroid variants
    Centroids {
        /// Land polygons (GeoJSON)
        #[arg(long)]
        land: PathBuf,

        /// Country polygons with numeric ids (GeoJSON)
        #[arg(long)]
        regions: Option<PathBuf>,

        /// Base output directory; files go to a `%m_%Y` sub-directory
        #[arg(long, default_value = "centroids")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    radar_netcdf::silence_hdf5_errors();

    match args.command {
        Command::Aggregate { config } => {
            info!(config = %config.display(), "Starting aggregation run");
            let run = load_run_config(&config)?;
            let outputs = run_aggregate(&run)?;
            for output in outputs {
                info!(
                    km = output.km,
                    hazard = %output.hazard_path.display(),
                    raster = ?output.raster_path,
                    "Wrote resolution"
                );
            }
        }
        Command::Concat {
            input_dir,
            output_dir,
            n_tracks,
            basins,
            scenario,
            year,
        } => {
            let job = ConcatJob {
                output_dir: output_dir.unwrap_or_else(|| input_dir.clone()),
                input_dir,
                n_tracks,
                basins,
                scenarios: scenario,
                years: year,
            };
            let written = run_concat(&job)?;
            info!(files = written.len(), "Concatenation finished");
        }
        Command::Centroids { land, regions, out_dir } => {
            let out_dir = out_dir.join(run_dir_name(Local::now().date_naive()));
            let written = run_centroids(&land, regions.as_deref(), &out_dir)?;
            info!(files = written.len(), out_dir = %out_dir.display(), "Centroid generation finished");
        }
    }

    Ok(())
}
