//! Date handling for hazard event bookkeeping.
//!
//! Hazard dates are stored as proleptic Gregorian ordinals where
//! 0001-01-01 is day 1.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::{HazardPrepError, HazardPrepResult};

/// Convert a calendar date to its ordinal.
pub fn to_ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

/// Convert an ordinal back to a calendar date.
pub fn from_ordinal(ordinal: i64) -> HazardPrepResult<NaiveDate> {
    i32::try_from(ordinal)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| HazardPrepError::InvalidDate(format!("ordinal {} out of range", ordinal)))
}

/// Calendar year of an ordinal.
pub fn year_of_ordinal(ordinal: i64) -> HazardPrepResult<i32> {
    from_ordinal(ordinal).map(|d| d.year())
}

/// Parse a date string into an ordinal.
///
/// Accepts ISO `YYYY-MM-DD` and day-first `DD-MM-YYYY`.
pub fn parse_date_ordinal(s: &str) -> HazardPrepResult<i64> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .map(to_ordinal)
        .map_err(|_| HazardPrepError::InvalidDate(s.to_string()))
}

/// Event name for a timestamp: `ev_YYYY-MM-DD`, or `ev_YYYY-MM-DD_HH:MM`
/// for sub-daily data.
pub fn event_name(time: &NaiveDateTime, subdaily: bool) -> String {
    if subdaily {
        time.format("ev_%Y-%m-%d_%H:%M").to_string()
    } else {
        time.format("ev_%Y-%m-%d").to_string()
    }
}

/// Number of calendar years spanned by a set of ordinals (inclusive).
///
/// Returns `None` for an empty set.
pub fn years_spanned(ordinals: &[i64]) -> HazardPrepResult<Option<i32>> {
    let mut span: Option<(i32, i32)> = None;
    for &ordinal in ordinals {
        let year = year_of_ordinal(ordinal)?;
        span = Some(match span {
            None => (year, year),
            Some((lo, hi)) => (lo.min(year), hi.max(year)),
        });
    }
    Ok(span.map(|(lo, hi)| hi - lo + 1))
}
