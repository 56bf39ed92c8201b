//! CF-convention time axes (`"<unit> since <reference>"`).

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{RadarError, RadarResult};

/// Parsed `units` attribute of a CF time variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    /// Length of one unit in seconds
    pub seconds_per_unit: f64,
    pub reference: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parse e.g. `"days since 2002-01-01"` or `"seconds since 1970-01-01 00:00:00"`.
    pub fn parse(units: &str) -> RadarResult<Self> {
        let invalid = || RadarError::InvalidFormat(format!("unsupported time units \"{}\"", units));

        let (unit, reference) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => 86_400.0,
            "hours" | "hour" | "h" => 3_600.0,
            "minutes" | "minute" | "min" => 60.0,
            "seconds" | "second" | "s" => 1.0,
            _ => return Err(invalid()),
        };

        let reference = parse_reference(reference.trim()).ok_or_else(invalid)?;
        Ok(Self {
            seconds_per_unit,
            reference,
        })
    }

    /// Convert an offset in these units to a timestamp.
    pub fn to_datetime(&self, offset: f64) -> RadarResult<NaiveDateTime> {
        if !offset.is_finite() {
            return Err(RadarError::InvalidFormat(format!("non-finite time offset {}", offset)));
        }
        let millis = (offset * self.seconds_per_unit * 1000.0).round() as i64;
        self.reference
            .checked_add_signed(Duration::milliseconds(millis))
            .ok_or_else(|| RadarError::InvalidFormat(format!("time offset {} out of range", offset)))
    }

    /// Convert a timestamp back to an offset in these units.
    pub fn to_offset(&self, time: &NaiveDateTime) -> f64 {
        let delta = *time - self.reference;
        delta.num_milliseconds() as f64 / 1000.0 / self.seconds_per_unit
    }
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_days_since() {
        let units = CfTimeUnits::parse("days since 2021-01-01").unwrap();
        assert_eq!(units.to_datetime(178.0).unwrap(), date(2021, 6, 28));
        assert_eq!(units.to_offset(&date(2021, 6, 28)), 178.0);
    }

    #[test]
    fn test_seconds_since_with_time() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01 00:00:00").unwrap();
        assert_eq!(units.to_datetime(86_400.0 * 2.0).unwrap(), date(1970, 1, 3));

        let units = CfTimeUnits::parse("hours since 2021-06-28T00:00:00Z").unwrap();
        let t = units.to_datetime(12.5).unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "12:30");
    }

    #[test]
    fn test_rejects_unknown_units() {
        assert!(CfTimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(CfTimeUnits::parse("days").is_err());
        assert!(CfTimeUnits::parse("days since yesterday").is_err());
    }
}
