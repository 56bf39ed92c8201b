//! Gridded snapshots of selected aggregated events.

use serde::{Deserialize, Serialize};

/// Aggregated intensities of selected events on the regular target grid.
///
/// Axes follow the radar convention: `chx` (easting) and `chy` (northing)
/// hold rounded cell centres in ascending order. `lat`/`lon` and every
/// time slice in `data` are stored row-major as `[iy * nx + ix]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRaster {
    /// Name of the intensity variable
    pub variable: String,
    pub units: String,
    pub chx: Vec<f64>,
    pub chy: Vec<f64>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Event date ordinals, one per slice
    pub time: Vec<i64>,
    pub data: Vec<Vec<f32>>,
}

impl EventRaster {
    /// Number of cells along x.
    pub fn nx(&self) -> usize {
        self.chx.len()
    }

    /// Number of cells along y.
    pub fn ny(&self) -> usize {
        self.chy.len()
    }

    /// Number of time slices.
    pub fn n_times(&self) -> usize {
        self.time.len()
    }

    /// Value at time slice `t`, row `iy`, column `ix`.
    pub fn value(&self, t: usize, iy: usize, ix: usize) -> Option<f32> {
        if ix >= self.nx() || iy >= self.ny() {
            return None;
        }
        self.data.get(t)?.get(iy * self.nx() + ix).copied()
    }

    /// Rename the intensity variable.
    pub fn rename(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_indexing() {
        let r = EventRaster {
            variable: "intensity".into(),
            units: "mm".into(),
            chx: vec![0.0, 1.0, 2.0],
            chy: vec![0.0, 1.0],
            lat: vec![0.0; 6],
            lon: vec![0.0; 6],
            time: vec![737969],
            data: vec![vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]],
        };
        assert_eq!(r.value(0, 1, 2), Some(5.0));
        assert_eq!(r.value(0, 2, 0), None);
        assert_eq!(r.value(1, 0, 0), None);
        assert_eq!(r.rename("MZC").variable, "MZC");
    }
}
