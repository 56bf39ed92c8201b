//! Building hail hazards from radar stacks.

use chrono::{Datelike, NaiveDateTime};
use hazard_common::{event_name, to_ordinal, CrsCode};
use hazard_processor::{Centroids, Hazard, SparseRowBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RadarError, RadarResult};
use crate::stack::RadarStack;
use crate::variables::VariableSpec;

/// Hazard type acronym of hail.
pub const HAIL: &str = "HL";

/// Options for [`hazard_from_radar`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarOptions {
    /// Requested variable, see [`VariableSpec::lookup`]
    pub varname: String,
    /// Keep only this calendar month (1-12)
    pub month: Option<u32>,
    /// `[lon_min, lon_max, lat_min, lat_max]`
    pub extent: Option<[f64; 4]>,
    /// Name events by date and time instead of date only
    pub subdaily: bool,
    /// Drop the file dates, e.g. for synthetic seasons
    pub ignore_date: bool,
    /// Number of years represented when dates are ignored
    pub n_year_input: Option<i32>,
    /// Stack the members of an ensemble forecast into separate events
    pub ensemble: bool,
    /// Forecast initialization per time step, added to ensemble event names
    pub forecast_init: Option<Vec<NaiveDateTime>>,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            varname: "MESHS".to_string(),
            month: None,
            extent: None,
            subdaily: false,
            ignore_date: false,
            n_year_input: None,
            ensemble: false,
            forecast_init: None,
        }
    }
}

/// Build a hail hazard with one event per time step of `stack`.
///
/// Every pixel becomes a centroid in lon/lat. NaN values are read as zero
/// and are not stored. With `options.ensemble` every `(time, member)` pair
/// is an event, named `ev_YYMMDD_ensMM` and dated by its time step.
pub fn hazard_from_radar(stack: &RadarStack, options: &RadarOptions) -> RadarResult<Hazard> {
    let spec = VariableSpec::lookup(&options.varname)?;
    let fixed_years = match (options.ignore_date, options.n_year_input) {
        (false, _) => None,
        (true, Some(n)) if n > 0 => Some(n),
        (true, Some(n)) => {
            return Err(RadarError::InvalidOptions(format!("n_year_input must be positive, got {}", n)))
        }
        (true, None) => {
            return Err(RadarError::InvalidOptions(
                "ignore_date requires n_year_input".to_string(),
            ))
        }
    };

    match (&stack.members, options.ensemble) {
        (Some(members), false) => {
            return Err(RadarError::InvalidOptions(format!(
                "stack has {} ensemble members, set ensemble to stack them into events",
                members.len()
            )))
        }
        (None, true) => {
            return Err(RadarError::InvalidOptions(
                "ensemble requires a stack with a member dimension".to_string(),
            ))
        }
        _ => {}
    }
    if options.ensemble {
        if options.extent.is_some() {
            warn!("extent combined with ensemble, rasters of the events are not plottable");
        }
        if options.ignore_date {
            warn!("ignore_date combined with ensemble, events are named by id");
        }
    } else if options.forecast_init.is_some() {
        warn!("forecast_init is only used for ensembles, ignoring it");
    }

    let filtered;
    let stack = match options.month {
        Some(month) => {
            filtered = stack.select_month(month)?;
            &filtered
        }
        None => stack,
    };
    if stack.n_times() == 0 {
        return Err(RadarError::InvalidOptions("no time steps left to build events".to_string()));
    }

    let pixels: Vec<usize> = match options.extent {
        Some([lon_min, lon_max, lat_min, lat_max]) => (0..stack.n_pixels())
            .filter(|&i| {
                let (lon, lat) = (stack.lon[i], stack.lat[i]);
                lon >= lon_min && lon <= lon_max && lat >= lat_min && lat <= lat_max
            })
            .collect(),
        None => (0..stack.n_pixels()).collect(),
    };
    if pixels.is_empty() {
        warn!(extent = ?options.extent, "No radar pixels inside the extent");
    }

    let slices = stack.field(&spec.nc_name)?;
    let mut rows = SparseRowBuilder::new(pixels.len());
    for slice in slices {
        rows.push_row(
            pixels
                .iter()
                .enumerate()
                .map(|(col, &pixel)| (col, spec.clean(slice[pixel]) as f64)),
        )?;
    }
    let intensity = rows.finish()?;

    let centroids = Centroids::from_lat_lon(
        pixels.iter().map(|&i| stack.lat[i]).collect(),
        pixels.iter().map(|&i| stack.lon[i]).collect(),
        CrsCode::Epsg4326,
    )?;

    let mut hazard = Hazard::new(HAIL, spec.unit, centroids, intensity)?;
    let n_events = hazard.n_events();
    let n_members = stack.n_members();
    let event_times: Vec<NaiveDateTime> = stack
        .times
        .iter()
        .flat_map(|&t| std::iter::repeat(t).take(n_members))
        .collect();

    let n_years = if let Some(n) = fixed_years {
        hazard.event_name = match &stack.years {
            Some(years) => hazard
                .event_id
                .iter()
                .zip(years.iter().flat_map(|&y| std::iter::repeat(y).take(n_members)))
                .map(|(id, year)| format!("ev_{}_y{}", id, year))
                .collect(),
            None => hazard.event_id.iter().map(|id| format!("ev_{}", id)).collect(),
        };
        n
    } else {
        hazard.event_name = match &stack.members {
            Some(members) if options.ensemble => {
                ensemble_event_names(&stack.times, members, options.forecast_init.as_deref())?
            }
            _ => stack.times.iter().map(|t| event_name(t, options.subdaily)).collect(),
        };
        let (min, max) = event_times
            .iter()
            .map(|t| t.year())
            .fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
        max - min + 1
    };
    hazard.date = if fixed_years.is_some() && !options.ensemble {
        Vec::new()
    } else {
        event_times.iter().map(|t| to_ordinal(t.date())).collect()
    };
    hazard.frequency = vec![1.0 / n_years as f64; n_events];
    hazard.check()?;

    debug!(n_years, variable = %spec.nc_name, "Set event metadata");
    info!(
        varname = %spec.name,
        events = n_events,
        centroids = hazard.n_centroids(),
        nnz = hazard.intensity.nnz(),
        "Built hazard from radar"
    );
    Ok(hazard)
}

/// `ev_YYMMDD_ensMM`, or `ev_YYMMDD_ensMM_init_YYMMDD_HH` with one forecast
/// initialization per time step. Time-major, like the stacked slices.
fn ensemble_event_names(
    times: &[NaiveDateTime],
    members: &[i32],
    forecast_init: Option<&[NaiveDateTime]>,
) -> RadarResult<Vec<String>> {
    if let Some(init) = forecast_init {
        if init.len() != times.len() {
            return Err(RadarError::InvalidOptions(format!(
                "forecast_init has {} entries for {} time steps",
                init.len(),
                times.len()
            )));
        }
    }

    let mut names = Vec::with_capacity(times.len() * members.len());
    for (i, time) in times.iter().enumerate() {
        for member in members {
            let mut name = format!("{}_ens{:02}", time.format("ev_%y%m%d"), member);
            if let Some(init) = forecast_init {
                name.push_str(&init[i].format("_init_%y%m%d_%H").to_string());
            }
            names.push(name);
        }
    }
    Ok(names)
}
