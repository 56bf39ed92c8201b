//! Locating radar archives and scratch directories for tests.
//!
//! Yearly radar archives are large and are not checked in. Tests that need
//! one look it up with [`radar_archive`] and skip when it is missing.

use std::path::{Path, PathBuf};

/// Environment variable pointing at a directory of radar archives.
pub const RADAR_DIR_ENV: &str = "HAZARD_RADAR_TEST_DIR";

/// Directory searched when [`RADAR_DIR_ENV`] is not set.
pub fn default_radar_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../radar-netcdf/testdata")
}

/// Path of the radar archive `name`, if it exists.
pub fn radar_archive(name: &str) -> Option<PathBuf> {
    let dir = std::env::var_os(RADAR_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(default_radar_dir);
    let path = dir.join(name);
    path.is_file().then_some(path)
}

/// Scratch directory removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}
