//! Reduction of many fine-grid intensities into one coarse cell value.
//!
//! Only non-zero source values reach the reducers. When zeros are real
//! data (`treat_zeros_as_nans == false`), every group is padded with
//! implicit zeros up to the size of the fullest group, which stands in for
//! the number of fine cells that fit into a coarse cell.

use serde::{Deserialize, Serialize};

/// Function used to combine the values falling into one target cell.
///
/// - **Max**: peak intensity, the usual choice for hail size or probability
/// - **Mean**: average over contributing values
/// - **Min**: lowest contributing value
/// - **Sum**: accumulated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    #[default]
    Max,
    Mean,
    Min,
    Sum,
}

impl AggregationMethod {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "max" => Some(Self::Max),
            "mean" => Some(Self::Mean),
            "min" => Some(Self::Min),
            "sum" => Some(Self::Sum),
            _ => None,
        }
    }

    /// Get the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Sum => "sum",
        }
    }
}

impl std::fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running statistics of one (event, cell) group.
#[derive(Debug, Clone, Copy)]
pub struct CellAccumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for CellAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl CellAccumulator {
    /// Add one source value. NaN is ignored.
    #[inline]
    pub fn push(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Number of values seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Reduce the group.
    ///
    /// `padded_count` is the group size after adding implicit zeros; pass
    /// `None` when zeros are treated as missing. Returns `None` for a group
    /// without valid values.
    pub fn finish(&self, method: AggregationMethod, padded_count: Option<usize>) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = padded_count.map_or(self.count, |p| p.max(self.count));
        let padded = n > self.count;

        let value = match method {
            AggregationMethod::Max => {
                if padded {
                    self.max.max(0.0)
                } else {
                    self.max
                }
            }
            AggregationMethod::Min => {
                if padded {
                    self.min.min(0.0)
                } else {
                    self.min
                }
            }
            AggregationMethod::Mean => self.sum / n as f64,
            AggregationMethod::Sum => self.sum,
        };
        Some(value)
    }
}
