//! Hail hazards from MeteoSwiss radar and COSMO HAILCAST NetCDF stacks.
//!
//! Radar archives hold one `(time, chy, chx)` field per variable. This crate
//! maps the requested variable name onto the stored one, cleans the values
//! and turns every time step into one hazard event:
//!
//! ```text
//! NetCDF files ──► RadarStack ──► hazard_from_radar(options) ──► Hazard
//!  (native)         month/extent    VariableSpec transform        "HL"
//! ```
//!
//! HAILCAST ensembles add a member axis; each `(time, member)` pair then
//! becomes an event.
//!
//! Reading and writing NetCDF needs libnetcdf and is compiled with the
//! `native` feature. Without it, [`read_radar_files`] and
//! [`write_event_raster`] return [`RadarError::NativeDisabled`].

pub mod cf_time;
pub mod error;
pub mod hazard;
pub mod stack;
pub mod variables;

#[cfg(feature = "native")]
mod native;

pub use error::{RadarError, RadarResult};
pub use hazard::{hazard_from_radar, RadarOptions, HAIL};
pub use stack::RadarStack;
pub use variables::{ValueTransform, VariableSpec};

#[cfg(feature = "native")]
pub use native::{read_radar_file, read_radar_files, silence_hdf5_errors, write_event_raster};

#[cfg(not(feature = "native"))]
mod disabled {
    use std::path::Path;

    use hazard_processor::EventRaster;

    use crate::error::{RadarError, RadarResult};
    use crate::stack::RadarStack;

    /// No-op without HDF5.
    pub fn silence_hdf5_errors() {}

    pub fn read_radar_file(_path: &Path, _variables: &[&str]) -> RadarResult<RadarStack> {
        Err(RadarError::NativeDisabled)
    }

    pub fn read_radar_files<P: AsRef<Path>>(_paths: &[P], _variables: &[&str]) -> RadarResult<RadarStack> {
        Err(RadarError::NativeDisabled)
    }

    pub fn write_event_raster(_path: &Path, _raster: &EventRaster) -> RadarResult<()> {
        Err(RadarError::NativeDisabled)
    }
}

#[cfg(not(feature = "native"))]
pub use disabled::{read_radar_file, read_radar_files, silence_hdf5_errors, write_event_raster};

/// Whether NetCDF support is compiled in.
pub fn native_enabled() -> bool {
    cfg!(feature = "native")
}
