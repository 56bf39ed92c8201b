//! The hazard container.

use std::collections::HashSet;

use hazard_common::time::years_spanned;
use serde::{Deserialize, Serialize};

use crate::centroids::Centroids;
use crate::error::{HazardError, Result};
use crate::sparse::{self, SparseMatrix};

/// Per-event, per-centroid hazard intensities plus event metadata.
///
/// `intensity` and `fraction` are `n_events × n_centroids`. `fraction` may
/// instead be left blank (no stored values, any shape) when the hazard has
/// no fractional footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    /// Hazard type acronym, e.g. "HL" for hail or "TC" for tropical cyclones
    pub haz_type: String,
    /// Intensity units
    pub units: String,
    pub centroids: Centroids,
    pub event_id: Vec<i64>,
    pub event_name: Vec<String>,
    /// Proleptic Gregorian ordinals; empty when dates are unknown
    pub date: Vec<i64>,
    /// Whether each event is historical (true) or synthetic
    pub orig: Vec<bool>,
    /// Annual frequency per event
    pub frequency: Vec<f64>,
    #[serde(default = "default_frequency_unit")]
    pub frequency_unit: String,
    #[serde(with = "sparse::serde_csr")]
    pub intensity: SparseMatrix,
    #[serde(with = "sparse::serde_csr")]
    pub fraction: SparseMatrix,
}

fn default_frequency_unit() -> String {
    "1/year".to_string()
}

impl Hazard {
    /// Create a hazard from an intensity matrix with default event metadata.
    ///
    /// Events get ids `1..=n`, names `ev_{id}`, no dates, unit frequency and
    /// are flagged historical.
    pub fn new(
        haz_type: impl Into<String>,
        units: impl Into<String>,
        centroids: Centroids,
        intensity: SparseMatrix,
    ) -> Result<Self> {
        let n = intensity.nrows();
        let event_id: Vec<i64> = (1..=n as i64).collect();
        let hazard = Self {
            haz_type: haz_type.into(),
            units: units.into(),
            event_name: event_id.iter().map(|id| format!("ev_{}", id)).collect(),
            event_id,
            date: Vec::new(),
            orig: vec![true; n],
            frequency: vec![1.0; n],
            frequency_unit: default_frequency_unit(),
            fraction: sparse::zeros(0, 0),
            intensity,
            centroids,
        };
        hazard.check()?;
        Ok(hazard)
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.event_id.len()
    }

    /// Number of centroids.
    pub fn n_centroids(&self) -> usize {
        self.centroids.len()
    }

    /// Verify the structural invariants.
    pub fn check(&self) -> Result<()> {
        let n = self.n_events();

        let sizes = [
            ("event_name", self.event_name.len()),
            ("orig", self.orig.len()),
            ("frequency", self.frequency.len()),
        ];
        for (name, len) in sizes {
            if len != n {
                return Err(HazardError::invalid_hazard(format!(
                    "{} has {} entries for {} events",
                    name, len, n
                )));
            }
        }
        if !self.date.is_empty() && self.date.len() != n {
            return Err(HazardError::invalid_hazard(format!(
                "date has {} entries for {} events",
                self.date.len(),
                n
            )));
        }

        let shape = (n, self.n_centroids());
        if (self.intensity.nrows(), self.intensity.ncols()) != shape {
            return Err(HazardError::invalid_hazard(format!(
                "intensity is {}x{}, expected {}x{}",
                self.intensity.nrows(),
                self.intensity.ncols(),
                shape.0,
                shape.1
            )));
        }
        if !sparse::is_blank(&self.fraction) && (self.fraction.nrows(), self.fraction.ncols()) != shape {
            return Err(HazardError::invalid_hazard(format!(
                "fraction is {}x{}, expected {}x{}",
                self.fraction.nrows(),
                self.fraction.ncols(),
                shape.0,
                shape.1
            )));
        }

        let mut seen = HashSet::with_capacity(n);
        if let Some(dup) = self.event_id.iter().find(|id| !seen.insert(**id)) {
            return Err(HazardError::invalid_hazard(format!("duplicate event id {}", dup)));
        }
        Ok(())
    }

    /// Largest event id, 0 for an empty hazard.
    pub fn max_event_id(&self) -> i64 {
        self.event_id.iter().copied().max().unwrap_or(0)
    }

    /// Number of calendar years spanned by the event dates.
    pub fn n_years(&self) -> Result<Option<i32>> {
        Ok(years_spanned(&self.date)?)
    }

    /// Keep the events at `rows`, in that order.
    pub fn select_events(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_events()) {
            return Err(HazardError::invalid_parameters(format!(
                "event row {} out of range for {} events",
                bad,
                self.n_events()
            )));
        }

        let fraction = if sparse::is_blank(&self.fraction) {
            self.fraction.clone()
        } else {
            sparse::select_rows(&self.fraction, rows)?
        };
        Ok(Self {
            haz_type: self.haz_type.clone(),
            units: self.units.clone(),
            centroids: self.centroids.clone(),
            event_id: rows.iter().map(|&r| self.event_id[r]).collect(),
            event_name: rows.iter().map(|&r| self.event_name[r].clone()).collect(),
            date: if self.date.is_empty() {
                Vec::new()
            } else {
                rows.iter().map(|&r| self.date[r]).collect()
            },
            orig: rows.iter().map(|&r| self.orig[r]).collect(),
            frequency: rows.iter().map(|&r| self.frequency[r]).collect(),
            frequency_unit: self.frequency_unit.clone(),
            intensity: sparse::select_rows(&self.intensity, rows)?,
            fraction,
        })
    }

    /// Keep the centroids at `indices`, in that order.
    pub fn select_centroids(&self, indices: &[usize]) -> Result<Self> {
        let fraction = if sparse::is_blank(&self.fraction) {
            self.fraction.clone()
        } else {
            sparse::select_cols(&self.fraction, indices)?
        };
        Ok(Self {
            centroids: self.centroids.select_indices(indices)?,
            intensity: sparse::select_cols(&self.intensity, indices)?,
            fraction,
            ..self.clone()
        })
    }

    /// Rows of the events whose date lies in `ordinals`.
    pub fn rows_on_dates(&self, ordinals: &[i64]) -> Vec<usize> {
        let wanted: HashSet<i64> = ordinals.iter().copied().collect();
        self.date
            .iter()
            .enumerate()
            .filter_map(|(row, d)| wanted.contains(d).then_some(row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseRowBuilder;
    use hazard_common::CrsCode;

    fn small_hazard() -> Hazard {
        let centroids =
            Centroids::from_lat_lon(vec![46.0, 46.5, 47.0], vec![7.0, 7.5, 8.0], CrsCode::Epsg4326).unwrap();
        let mut b = SparseRowBuilder::new(3);
        b.push_row(vec![(0, 10.0), (2, 30.0)]).unwrap();
        b.push_row(vec![(1, 20.0)]).unwrap();
        Hazard::new("HL", "mm", centroids, b.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_new_assigns_default_metadata() {
        let h = small_hazard();
        assert_eq!(h.event_id, vec![1, 2]);
        assert_eq!(h.event_name, vec!["ev_1", "ev_2"]);
        assert_eq!(h.max_event_id(), 2);
        assert!(h.date.is_empty());
    }

    #[test]
    fn test_check_detects_duplicates_and_shapes() {
        let mut h = small_hazard();
        h.event_id = vec![5, 5];
        assert!(h.check().is_err());

        let mut h = small_hazard();
        h.date = vec![737969];
        assert!(h.check().is_err());

        let mut h = small_hazard();
        h.fraction = sparse::zeros(2, 3);
        assert!(h.check().is_ok());
        h.fraction = {
            let mut b = SparseRowBuilder::new(2);
            b.push_row(vec![(0, 1.0)]).unwrap();
            b.finish().unwrap()
        };
        assert!(h.check().is_err());
    }

    #[test]
    fn test_select_events_and_centroids() {
        let mut h = small_hazard();
        h.date = vec![737969, 737970];

        let ev = h.select_events(&[1]).unwrap();
        assert_eq!(ev.event_id, vec![2]);
        assert_eq!(ev.date, vec![737970]);
        assert_eq!(sparse::dense_row(&ev.intensity, 0), vec![0.0, 20.0, 0.0]);

        let cen = h.select_centroids(&[2, 0]).unwrap();
        assert_eq!(cen.n_centroids(), 2);
        assert_eq!(sparse::dense_row(&cen.intensity, 0), vec![30.0, 10.0]);
        cen.check().unwrap();
    }

    #[test]
    fn test_select_centroids_with_repeated_index() {
        let centroids = Centroids::from_lat_lon(vec![46.0, 46.5], vec![7.0, 7.5], CrsCode::Epsg4326).unwrap();
        let mut b = SparseRowBuilder::new(2);
        b.push_dense_row(&[20.0, 7.0]).unwrap();
        let h = Hazard::new("HL", "mm", centroids, b.finish().unwrap()).unwrap();

        let sel = h.select_centroids(&[0, 0, 1]).unwrap();
        sel.check().unwrap();
        assert_eq!(sel.n_centroids(), 3);
        assert_eq!(sparse::dense_row(&sel.intensity, 0), vec![20.0, 20.0, 7.0]);
    }

    #[test]
    fn test_rows_on_dates() {
        let mut h = small_hazard();
        h.date = vec![737969, 737970];
        assert_eq!(h.rows_on_dates(&[737970, 1]), vec![1]);
    }
}
