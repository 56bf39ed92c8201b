//! Reading and writing hazard and centroid files.
//!
//! Files are JSON documents. A path ending in `.gz` is gzip-compressed on
//! write and decompressed on read.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::centroids::Centroids;
use crate::error::{HazardError, Result};
use crate::hazard::Hazard;
use crate::raster::EventRaster;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, value)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        serde_json::to_writer(&mut file, value)?;
        file.flush()?;
    }
    Ok(fs::metadata(path)?.len())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = BufReader::new(File::open(path)?);
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(serde_json::from_reader(reader)?)
}

/// Write a hazard to `path`.
pub fn save_hazard(path: impl AsRef<Path>, hazard: &Hazard) -> Result<()> {
    let path = path.as_ref();
    hazard.check()?;
    let bytes = write_json(path, hazard)?;
    info!(
        path = %path.display(),
        events = hazard.n_events(),
        centroids = hazard.n_centroids(),
        bytes,
        "Saved hazard"
    );
    Ok(())
}

/// Read a hazard from `path` and verify it.
pub fn load_hazard(path: impl AsRef<Path>) -> Result<Hazard> {
    let path = path.as_ref();
    let hazard: Hazard = read_json(path)?;
    hazard.check()?;
    debug!(
        path = %path.display(),
        haz_type = %hazard.haz_type,
        events = hazard.n_events(),
        centroids = hazard.n_centroids(),
        "Loaded hazard"
    );
    Ok(hazard)
}

/// Write centroids to `path`.
pub fn save_centroids(path: impl AsRef<Path>, centroids: &Centroids) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_json(path, centroids)?;
    info!(path = %path.display(), centroids = centroids.len(), bytes, "Saved centroids");
    Ok(())
}

/// Read centroids from `path`.
pub fn load_centroids(path: impl AsRef<Path>) -> Result<Centroids> {
    let path = path.as_ref();
    let centroids: Centroids = read_json(path)?;
    if centroids.lat.len() != centroids.lon.len() {
        return Err(HazardError::invalid_hazard(format!(
            "{} has {} latitudes but {} longitudes",
            path.display(),
            centroids.lat.len(),
            centroids.lon.len()
        )));
    }
    debug!(path = %path.display(), centroids = centroids.len(), "Loaded centroids");
    Ok(centroids)
}

/// Write event rasters to `path`.
pub fn save_raster(path: impl AsRef<Path>, raster: &EventRaster) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_json(path, raster)?;
    info!(
        path = %path.display(),
        variable = %raster.variable,
        times = raster.n_times(),
        bytes,
        "Saved event raster"
    );
    Ok(())
}

/// Read event rasters from `path`.
pub fn load_raster(path: impl AsRef<Path>) -> Result<EventRaster> {
    read_json(path.as_ref())
}
