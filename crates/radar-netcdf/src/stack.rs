//! In-memory stack of gridded radar fields.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use tracing::debug;

use crate::error::{RadarError, RadarResult};

/// Radar fields on a fixed `chy × chx` grid over a sequence of time steps.
///
/// `lat`/`lon` and every field slice are row-major, `[iy * nx + ix]`.
/// Ensemble output carries one slice per `(time, member)`, time-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarStack {
    pub times: Vec<NaiveDateTime>,
    /// Easting of the pixel centres (LV95)
    pub chx: Vec<f64>,
    /// Northing of the pixel centres (LV95)
    pub chy: Vec<f64>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Variable name to one slice per time step and member
    pub fields: BTreeMap<String, Vec<Vec<f32>>>,
    /// Synthetic season year per time step, when the source carries one
    pub years: Option<Vec<i32>>,
    /// Ensemble member numbers, when the source is a multi-member forecast
    pub members: Option<Vec<i32>>,
}

impl RadarStack {
    /// Create an empty stack on the given grid.
    pub fn new(chx: Vec<f64>, chy: Vec<f64>, lat: Vec<f64>, lon: Vec<f64>) -> RadarResult<Self> {
        let stack = Self {
            times: Vec::new(),
            chx,
            chy,
            lat,
            lon,
            fields: BTreeMap::new(),
            years: None,
            members: None,
        };
        stack.check()?;
        Ok(stack)
    }

    /// Number of pixels in X direction.
    pub fn nx(&self) -> usize {
        self.chx.len()
    }

    /// Number of pixels in Y direction.
    pub fn ny(&self) -> usize {
        self.chy.len()
    }

    /// Pixels per slice.
    pub fn n_pixels(&self) -> usize {
        self.nx() * self.ny()
    }

    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// Number of ensemble members, 1 without a member axis.
    pub fn n_members(&self) -> usize {
        self.members.as_ref().map_or(1, Vec::len)
    }

    /// Slices per variable.
    pub fn n_slices(&self) -> usize {
        self.n_times() * self.n_members()
    }

    /// Add or replace a variable. Needs one slice per existing time step
    /// and member.
    pub fn insert_field(&mut self, name: impl Into<String>, slices: Vec<Vec<f32>>) -> RadarResult<()> {
        let name = name.into();
        check_slices(&name, &slices, self.n_slices(), self.n_pixels())?;
        self.fields.insert(name, slices);
        Ok(())
    }

    /// Slices of a variable.
    pub fn field(&self, name: &str) -> RadarResult<&[Vec<f32>]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| RadarError::MissingData(format!("variable {}", name)))
    }

    /// Verify the grid and slice dimensions.
    pub fn check(&self) -> RadarResult<()> {
        let n = self.n_pixels();
        if self.lat.len() != n || self.lon.len() != n {
            return Err(RadarError::InvalidFormat(format!(
                "lat/lon have {}/{} values for a {}x{} grid",
                self.lat.len(),
                self.lon.len(),
                self.ny(),
                self.nx()
            )));
        }
        if self.members.as_ref().is_some_and(Vec::is_empty) {
            return Err(RadarError::InvalidFormat("ensemble without members".to_string()));
        }
        for (name, slices) in &self.fields {
            check_slices(name, slices, self.n_slices(), n)?;
        }
        if let Some(years) = &self.years {
            if years.len() != self.n_times() {
                return Err(RadarError::InvalidFormat(format!(
                    "{} years for {} time steps",
                    years.len(),
                    self.n_times()
                )));
            }
        }
        Ok(())
    }

    /// Keep the time steps at `indices`, in that order.
    pub fn select_times(&self, indices: &[usize]) -> RadarResult<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_times()) {
            return Err(RadarError::InvalidOptions(format!(
                "time index {} out of range for {} steps",
                bad,
                self.n_times()
            )));
        }
        let m = self.n_members();
        Ok(Self {
            times: indices.iter().map(|&i| self.times[i]).collect(),
            chx: self.chx.clone(),
            chy: self.chy.clone(),
            lat: self.lat.clone(),
            lon: self.lon.clone(),
            fields: self
                .fields
                .iter()
                .map(|(name, slices)| {
                    let kept = indices
                        .iter()
                        .flat_map(|&i| slices[i * m..(i + 1) * m].iter().cloned())
                        .collect();
                    (name.clone(), kept)
                })
                .collect(),
            years: self
                .years
                .as_ref()
                .map(|y| indices.iter().map(|&i| y[i]).collect()),
            members: self.members.clone(),
        })
    }

    /// Keep the time steps in calendar month `month` (1-12) of any year.
    pub fn select_month(&self, month: u32) -> RadarResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(RadarError::InvalidOptions(format!("month {} is not in 1..=12", month)));
        }
        let indices: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter_map(|(i, t)| (t.month() == month).then_some(i))
            .collect();
        debug!(month, kept = indices.len(), total = self.n_times(), "Selected month");
        self.select_times(&indices)
    }

    /// Concatenate stacks on the same grid along time.
    ///
    /// Only variables present in every part are kept.
    pub fn concat(parts: Vec<RadarStack>) -> RadarResult<Self> {
        let mut iter = parts.into_iter();
        let mut merged = iter
            .next()
            .ok_or_else(|| RadarError::InvalidOptions("no radar stacks to concatenate".into()))?;

        for part in iter {
            if part.chx != merged.chx || part.chy != merged.chy {
                return Err(RadarError::InvalidFormat(format!(
                    "grid {}x{} does not match {}x{}",
                    part.ny(),
                    part.nx(),
                    merged.ny(),
                    merged.nx()
                )));
            }
            if part.members != merged.members {
                return Err(RadarError::InvalidFormat(format!(
                    "ensemble members {:?} do not match {:?}",
                    part.members, merged.members
                )));
            }
            merged.fields.retain(|name, _| part.fields.contains_key(name));
            for (name, slices) in part.fields {
                if let Some(existing) = merged.fields.get_mut(&name) {
                    existing.extend(slices);
                }
            }
            merged.years = match (merged.years.take(), part.years) {
                (Some(mut a), Some(b)) => {
                    a.extend(b);
                    Some(a)
                }
                _ => None,
            };
            merged.times.extend(part.times);
        }
        merged.check()?;
        Ok(merged)
    }
}

fn check_slices(name: &str, slices: &[Vec<f32>], n_slices: usize, n_pixels: usize) -> RadarResult<()> {
    if slices.len() != n_slices {
        return Err(RadarError::InvalidFormat(format!(
            "{} has {} slices, expected {}",
            name,
            slices.len(),
            n_slices
        )));
    }
    if let Some(bad) = slices.iter().find(|s| s.len() != n_pixels) {
        return Err(RadarError::InvalidFormat(format!(
            "{} slice has {} values for {} pixels",
            name,
            bad.len(),
            n_pixels
        )));
    }
    Ok(())
}
