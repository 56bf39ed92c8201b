//! Catalogue of radar and HAILCAST variables.
//!
//! A requested variable name maps to the name stored in the NetCDF files,
//! its unit and an optional value transform applied while reading.

use tracing::warn;

use crate::error::{RadarError, RadarResult};

/// Per-value transform applied to a radar field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueTransform {
    /// Use values as stored.
    Identity,
    /// Values at or below the threshold become zero.
    ThresholdZero(f32),
    /// Threshold as above, then round to whole units, halves to even.
    ThresholdZeroRound(f32),
    /// Multiply by a constant factor.
    Scale(f32),
}

impl ValueTransform {
    /// Apply the transform to one value.
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match *self {
            Self::Identity => value,
            Self::ThresholdZero(t) => {
                if value > t {
                    value
                } else {
                    0.0
                }
            }
            Self::ThresholdZeroRound(t) => {
                if value > t {
                    value.round_ties_even()
                } else {
                    0.0
                }
            }
            Self::Scale(f) => value * f,
        }
    }
}

/// How a requested variable is read.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Name as requested by the caller
    pub name: String,
    /// Name of the variable inside the NetCDF files
    pub nc_name: String,
    pub unit: &'static str,
    pub transform: ValueTransform,
}

impl VariableSpec {
    /// Look up a variable by its requested name.
    pub fn lookup(varname: &str) -> RadarResult<Self> {
        use ValueTransform::*;

        let (nc_name, unit, transform) = match varname {
            "MESHS" | "MESHS_4km" => ("MZC", "mm", Identity),
            "MESHSdBZ" | "MESHSdBZ_p3" => ("MESHSdBZ", "mm", Identity),
            "POH" => ("BZC", "%", Identity),
            v if v.contains("DHAIL") => (v, "mm", Identity),
            "dBZ" | "dBZfiltered" => ("CZC", "dBZ", ThresholdZero(40.0)),
            "possible_hail" => ("possible_hail", "[ ](boolean)", Identity),
            "durPOH" => ("BZC80_dur", "[min]", Scale(5.0)),
            "MESHSweigh" => ("MESHSweigh", "mm (scaled by duration)", Identity),
            "HKE" => ("HKE", "Jm-2", Identity),
            "crowd" | "crowdFiltered" => {
                warn!(varname, "Using smoothed data for crowd-sourced reports");
                ("h_smooth", "mm", Identity)
            }
            "E_kin" | "E_kinCC" => ("E_kin", "Jm-2", Identity),
            "VIL" => ("dLZC", "g/m2", ThresholdZeroRound(10.0)),
            other => return Err(RadarError::UnknownVariable(other.to_string())),
        };

        Ok(Self {
            name: varname.to_string(),
            nc_name: nc_name.to_string(),
            unit,
            transform,
        })
    }

    /// Clean one stored value: NaN becomes zero, then the transform applies.
    #[inline]
    pub fn clean(&self, value: f32) -> f32 {
        if value.is_nan() {
            0.0
        } else {
            self.transform.apply(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_names_and_units() {
        let meshs = VariableSpec::lookup("MESHS_4km").unwrap();
        assert_eq!(meshs.nc_name, "MZC");
        assert_eq!(meshs.unit, "mm");

        let poh = VariableSpec::lookup("POH").unwrap();
        assert_eq!((poh.nc_name.as_str(), poh.unit), ("BZC", "%"));

        let dhail = VariableSpec::lookup("DHAIL_MX").unwrap();
        assert_eq!(dhail.nc_name, "DHAIL_MX");

        let crowd = VariableSpec::lookup("crowdFiltered").unwrap();
        assert_eq!(crowd.nc_name, "h_smooth");
    }

    #[test]
    fn test_unknown_variable() {
        assert!(matches!(
            VariableSpec::lookup("TOTAL_PREC"),
            Err(RadarError::UnknownVariable(name)) if name == "TOTAL_PREC"
        ));
    }

    #[test]
    fn test_transforms() {
        let dbz = VariableSpec::lookup("dBZ").unwrap();
        assert_eq!(dbz.clean(40.0), 0.0);
        assert_eq!(dbz.clean(52.5), 52.5);

        let dur = VariableSpec::lookup("durPOH").unwrap();
        assert_eq!(dur.unit, "[min]");
        assert_eq!(dur.clean(3.0), 15.0);

        let vil = VariableSpec::lookup("VIL").unwrap();
        assert_eq!(vil.clean(9.9), 0.0);
        assert_eq!(vil.clean(12.6), 13.0);
        assert_eq!(vil.clean(12.5), 12.0);
        assert_eq!(vil.clean(13.5), 14.0);
        assert_eq!(vil.clean(f32::NAN), 0.0);
    }
}
