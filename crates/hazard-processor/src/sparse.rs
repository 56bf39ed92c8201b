//! Sparse event × centroid matrices.
//!
//! Hazard intensities are mostly zero: a hail day touches a small share of
//! the radar domain. Rows are events, columns are centroids, and only
//! non-zero values are stored.

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};

/// CSR matrix of hazard values.
pub type SparseMatrix = CsrMatrix<f64>;

/// Incrementally assembles a CSR matrix one row at a time.
///
/// Zero and non-finite values are dropped, so the result only stores real
/// intensities.
#[derive(Debug, Clone)]
pub struct SparseRowBuilder {
    ncols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseRowBuilder {
    /// Create a builder for rows with `ncols` columns.
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            row_offsets: vec![0],
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of rows pushed so far.
    pub fn nrows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// Append a row given as `(column, value)` pairs in any order.
    pub fn push_row<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut row: Vec<(usize, f64)> = entries
            .into_iter()
            .filter(|(_, v)| *v != 0.0 && v.is_finite())
            .collect();
        row.sort_unstable_by_key(|(c, _)| *c);

        for pair in row.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(HazardError::Sparse(format!(
                    "duplicate column {} in row {}",
                    pair[0].0,
                    self.nrows()
                )));
            }
        }
        if let Some(&(col, _)) = row.last() {
            if col >= self.ncols {
                return Err(HazardError::Sparse(format!(
                    "column {} out of range for {} columns",
                    col, self.ncols
                )));
            }
        }

        for (c, v) in row {
            self.col_indices.push(c);
            self.values.push(v);
        }
        self.row_offsets.push(self.col_indices.len());
        Ok(())
    }

    /// Append a row without entries.
    pub fn push_empty_row(&mut self) {
        self.row_offsets.push(self.col_indices.len());
    }

    /// Append a dense row.
    pub fn push_dense_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.ncols {
            return Err(HazardError::Sparse(format!(
                "dense row has {} values, expected {}",
                row.len(),
                self.ncols
            )));
        }
        self.push_row(row.iter().copied().enumerate())
    }

    /// Finish assembly.
    pub fn finish(self) -> Result<SparseMatrix> {
        let nrows = self.nrows();
        Ok(CsrMatrix::try_from_csr_data(
            nrows,
            self.ncols,
            self.row_offsets,
            self.col_indices,
            self.values,
        )?)
    }
}

/// An all-zero matrix.
pub fn zeros(nrows: usize, ncols: usize) -> SparseMatrix {
    CsrMatrix::zeros(nrows, ncols)
}

/// Check whether a matrix stores no values at all.
pub fn is_blank(matrix: &SparseMatrix) -> bool {
    matrix.nnz() == 0
}

/// Iterate stored non-zero values as `(row, col, value)`.
pub fn nonzero_entries(matrix: &SparseMatrix) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
    matrix
        .triplet_iter()
        .filter(|(_, _, v)| **v != 0.0)
        .map(|(r, c, v)| (r, c, *v))
}

/// Entries of one row as `(col, value)` pairs.
pub fn row_entries(matrix: &SparseMatrix, row: usize) -> Vec<(usize, f64)> {
    match matrix.get_row(row) {
        Some(r) => r
            .col_indices()
            .iter()
            .copied()
            .zip(r.values().iter().copied())
            .collect(),
        None => Vec::new(),
    }
}

/// Expand one row into a dense vector.
pub fn dense_row(matrix: &SparseMatrix, row: usize) -> Vec<f64> {
    let mut out = vec![0.0; matrix.ncols()];
    for (c, v) in row_entries(matrix, row) {
        out[c] = v;
    }
    out
}

/// Keep only the given rows, in the given order.
pub fn select_rows(matrix: &SparseMatrix, rows: &[usize]) -> Result<SparseMatrix> {
    let mut builder = SparseRowBuilder::new(matrix.ncols());
    for &r in rows {
        if r >= matrix.nrows() {
            return Err(HazardError::Sparse(format!(
                "row {} out of range for {} rows",
                r,
                matrix.nrows()
            )));
        }
        builder.push_row(row_entries(matrix, r))?;
    }
    builder.finish()
}

/// Keep only the given columns, renumbered in the given order.
///
/// A column listed more than once is copied to each of its positions.
pub fn select_cols(matrix: &SparseMatrix, cols: &[usize]) -> Result<SparseMatrix> {
    let mut positions: Vec<Vec<usize>> = vec![Vec::new(); matrix.ncols()];
    for (new, &old) in cols.iter().enumerate() {
        let slot = positions.get_mut(old).ok_or_else(|| {
            HazardError::Sparse(format!("column {} out of range for {} columns", old, matrix.ncols()))
        })?;
        slot.push(new);
    }

    let mut builder = SparseRowBuilder::new(cols.len());
    for r in 0..matrix.nrows() {
        let entries = row_entries(matrix, r)
            .into_iter()
            .flat_map(|(c, v)| positions[c].iter().map(move |&n| (n, v)));
        builder.push_row(entries)?;
    }
    builder.finish()
}

/// Stack matrices with equal column counts on top of each other.
pub fn vstack(parts: &[&SparseMatrix]) -> Result<SparseMatrix> {
    let ncols = parts.first().map(|m| m.ncols()).unwrap_or(0);
    let mut builder = SparseRowBuilder::new(ncols);
    for part in parts {
        if part.ncols() != ncols {
            return Err(HazardError::Sparse(format!(
                "cannot stack {} columns onto {} columns",
                part.ncols(),
                ncols
            )));
        }
        for r in 0..part.nrows() {
            builder.push_row(row_entries(part, r))?;
        }
    }
    builder.finish()
}

/// Serialized CSR layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseRepr {
    pub nrows: usize,
    pub ncols: usize,
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f64>,
}

impl From<&SparseMatrix> for SparseRepr {
    fn from(m: &SparseMatrix) -> Self {
        Self {
            nrows: m.nrows(),
            ncols: m.ncols(),
            indptr: m.row_offsets().to_vec(),
            indices: m.col_indices().to_vec(),
            data: m.values().to_vec(),
        }
    }
}

impl SparseRepr {
    /// Rebuild the matrix, validating the CSR structure.
    pub fn into_matrix(self) -> Result<SparseMatrix> {
        Ok(CsrMatrix::try_from_csr_data(
            self.nrows,
            self.ncols,
            self.indptr,
            self.indices,
            self.data,
        )?)
    }
}

/// Serde adapter for `SparseMatrix` fields.
pub mod serde_csr {
    use super::{SparseMatrix, SparseRepr};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(matrix: &SparseMatrix, serializer: S) -> Result<S::Ok, S::Error> {
        SparseRepr::from(matrix).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SparseMatrix, D::Error> {
        let repr = SparseRepr::deserialize(deserializer)?;
        repr.into_matrix().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseMatrix {
        let mut b = SparseRowBuilder::new(4);
        b.push_row(vec![(3, 2.0), (0, 1.0)]).unwrap();
        b.push_empty_row();
        b.push_dense_row(&[0.0, 5.0, 0.0, f64::NAN]).unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn test_builder_sorts_and_drops_zeros() {
        let m = sample();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.nnz(), 3);
        assert_eq!(row_entries(&m, 0), vec![(0, 1.0), (3, 2.0)]);
        assert!(row_entries(&m, 1).is_empty());
        assert_eq!(dense_row(&m, 2), vec![0.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_builder_rejects_bad_columns() {
        let mut b = SparseRowBuilder::new(2);
        assert!(b.push_row(vec![(2, 1.0)]).is_err());
        assert!(b.push_row(vec![(1, 1.0), (1, 2.0)]).is_err());
    }

    #[test]
    fn test_select_rows_and_cols() {
        let m = sample();
        let rows = select_rows(&m, &[2, 0]).unwrap();
        assert_eq!(row_entries(&rows, 0), vec![(1, 5.0)]);
        assert_eq!(row_entries(&rows, 1), vec![(0, 1.0), (3, 2.0)]);

        let cols = select_cols(&m, &[3, 1]).unwrap();
        assert_eq!(cols.ncols(), 2);
        assert_eq!(row_entries(&cols, 0), vec![(0, 2.0)]);
        assert_eq!(row_entries(&cols, 2), vec![(1, 5.0)]);
    }

    #[test]
    fn test_select_cols_repeats_columns() {
        let m = sample();
        let cols = select_cols(&m, &[0, 0, 3]).unwrap();
        assert_eq!(cols.ncols(), 3);
        assert_eq!(dense_row(&cols, 0), vec![1.0, 1.0, 2.0]);
        assert!(row_entries(&cols, 2).is_empty());
        assert!(select_cols(&m, &[4]).is_err());
    }

    #[test]
    fn test_vstack() {
        let m = sample();
        let stacked = vstack(&[&m, &m]).unwrap();
        assert_eq!(stacked.nrows(), 6);
        assert_eq!(stacked.nnz(), 6);
        assert!(vstack(&[&m, &zeros(1, 3)]).is_err());
    }

    #[test]
    fn test_nonzero_entries() {
        let entries: Vec<_> = nonzero_entries(&sample()).collect();
        assert_eq!(entries, vec![(0, 0, 1.0), (0, 3, 2.0), (2, 1, 5.0)]);
    }
}
