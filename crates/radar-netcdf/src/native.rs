//! Native NetCDF access using the netcdf library.
//!
//! Radar archives are one file per year holding `(time, chy, chx)` fields
//! plus 2D `lat`/`lon` coordinates. HAILCAST ensembles add a member axis,
//! `(time, member, chy, chx)`. Event rasters are written in the same
//! layout so they can be opened next to the radar files.

use std::path::Path;
use std::sync::Once;

use tracing::{debug, info};

use hazard_processor::EventRaster;

use crate::cf_time::CfTimeUnits;
use crate::error::{RadarError, RadarResult};
use crate::stack::RadarStack;

/// Ordinal of 1970-01-01, the reference of written time axes.
const UNIX_EPOCH_ORDINAL: i64 = 719_163;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully, e.g. when probing optional attributes. Call this
/// early in `main()` before any HDF5/NetCDF operations occur; it is safe to
/// call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(hdf5_metno_sys::h5e::H5E_DEFAULT, None, std::ptr::null_mut());
        }
    });
}

/// Read several radar files and concatenate them along time.
pub fn read_radar_files<P: AsRef<Path>>(paths: &[P], variables: &[&str]) -> RadarResult<RadarStack> {
    let stacks = paths
        .iter()
        .map(|p| read_radar_file(p.as_ref(), variables))
        .collect::<RadarResult<Vec<_>>>()?;
    let stack = RadarStack::concat(stacks)?;
    info!(
        files = paths.len(),
        times = stack.n_times(),
        ny = stack.ny(),
        nx = stack.nx(),
        "Read radar files"
    );
    Ok(stack)
}

/// Read `variables` from one radar file.
pub fn read_radar_file(path: &Path, variables: &[&str]) -> RadarResult<RadarStack> {
    silence_hdf5_errors();
    debug!(path = %path.display(), ?variables, "Opening radar file");

    let file = netcdf::open(path)
        .map_err(|e| RadarError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e)))?;

    let chx = read_f64(&file, "chx")?;
    let chy = read_f64(&file, "chy")?;
    let lat = read_f64(&file, "lat")?;
    let lon = read_f64(&file, "lon")?;
    let mut stack = RadarStack::new(chx, chy, lat, lon)?;

    let time_var = file
        .variable("time")
        .ok_or_else(|| RadarError::MissingData("time variable".to_string()))?;
    let units = get_string_attr(&time_var, "units")
        .ok_or_else(|| RadarError::MissingData("units of time".to_string()))?;
    let units = CfTimeUnits::parse(&units)?;
    let offsets: Vec<f64> = time_var
        .get_values(..)
        .map_err(|e| RadarError::InvalidFormat(format!("Failed to read time: {}", e)))?;
    stack.times = offsets
        .iter()
        .map(|&o| units.to_datetime(o))
        .collect::<RadarResult<_>>()?;

    if file.variable("year").is_some() {
        let years = read_f64(&file, "year")?;
        stack.years = Some(years.iter().map(|y| y.round() as i32).collect());
    }

    let n_pixels = stack.n_pixels();
    for &name in variables {
        let var = file
            .variable(name)
            .ok_or_else(|| RadarError::MissingData(format!("{} variable in {}", name, path.display())))?;
        if stack.members.is_none() {
            stack.members = read_members(&file, &var)?;
        }
        let raw: Vec<f32> = var
            .get_values(..)
            .map_err(|e| RadarError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

        let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);
        let fill_value = get_f32_attr(&var, "_FillValue");

        let slices = raw
            .chunks(n_pixels.max(1))
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&v| {
                        if Some(v) == fill_value {
                            f32::NAN
                        } else {
                            v * scale_factor + add_offset
                        }
                    })
                    .collect()
            })
            .collect();
        stack.insert_field(name, slices)?;
    }

    debug!(path = %path.display(), times = stack.n_times(), "Read radar file");
    Ok(stack)
}

/// Write event rasters as `(time, chy, chx)` NetCDF.
pub fn write_event_raster(path: &Path, raster: &EventRaster) -> RadarResult<()> {
    silence_hdf5_errors();
    let nc_err = |e: netcdf::Error| RadarError::InvalidFormat(format!("Failed to write {}: {}", path.display(), e));

    let mut file = netcdf::create(path).map_err(nc_err)?;
    file.add_dimension("time", raster.n_times()).map_err(nc_err)?;
    file.add_dimension("chy", raster.ny()).map_err(nc_err)?;
    file.add_dimension("chx", raster.nx()).map_err(nc_err)?;

    let days: Vec<f64> = raster.time.iter().map(|o| (o - UNIX_EPOCH_ORDINAL) as f64).collect();
    let mut time = file.add_variable::<f64>("time", &["time"]).map_err(nc_err)?;
    time.put_attribute("units", "days since 1970-01-01").map_err(nc_err)?;
    time.put_values(&days, ..).map_err(nc_err)?;

    let mut chx = file.add_variable::<f64>("chx", &["chx"]).map_err(nc_err)?;
    chx.put_attribute("units", "m").map_err(nc_err)?;
    chx.put_values(&raster.chx, ..).map_err(nc_err)?;

    let mut chy = file.add_variable::<f64>("chy", &["chy"]).map_err(nc_err)?;
    chy.put_attribute("units", "m").map_err(nc_err)?;
    chy.put_values(&raster.chy, ..).map_err(nc_err)?;

    let mut lat = file.add_variable::<f64>("lat", &["chy", "chx"]).map_err(nc_err)?;
    lat.put_attribute("units", "degrees_north").map_err(nc_err)?;
    lat.put_values(&raster.lat, ..).map_err(nc_err)?;

    let mut lon = file.add_variable::<f64>("lon", &["chy", "chx"]).map_err(nc_err)?;
    lon.put_attribute("units", "degrees_east").map_err(nc_err)?;
    lon.put_values(&raster.lon, ..).map_err(nc_err)?;

    let data: Vec<f32> = raster.data.iter().flatten().copied().collect();
    let mut var = file
        .add_variable::<f32>(&raster.variable, &["time", "chy", "chx"])
        .map_err(nc_err)?;
    var.put_attribute("units", raster.units.as_str()).map_err(nc_err)?;
    var.put_attribute("coordinates", "lat lon").map_err(nc_err)?;
    if !data.is_empty() {
        var.put_values(&data, ..).map_err(nc_err)?;
    }

    info!(
        path = %path.display(),
        variable = %raster.variable,
        times = raster.n_times(),
        "Wrote event raster"
    );
    Ok(())
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Member numbers of a `(time, member, chy, chx)` variable.
///
/// Uses the coordinate variable of the member dimension when there is one.
fn read_members(file: &netcdf::File, var: &netcdf::Variable) -> RadarResult<Option<Vec<i32>>> {
    let dims = var.dimensions();
    if dims.len() != 4 {
        return Ok(None);
    }
    let dim = &dims[1];
    let name = dim.name();
    let members: Vec<i32> = if file.variable(&name).is_some() {
        read_f64(file, &name)?.iter().map(|m| m.round() as i32).collect()
    } else {
        (0..dim.len() as i32).collect()
    };
    debug!(dimension = %name, members = members.len(), "Found ensemble dimension");
    Ok(Some(members))
}

fn read_f64(file: &netcdf::File, name: &str) -> RadarResult<Vec<f64>> {
    file.variable(name)
        .ok_or_else(|| RadarError::MissingData(format!("{} variable", name)))?
        .get_values(..)
        .map_err(|e| RadarError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
