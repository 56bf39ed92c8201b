//! Regular cell grids used as regridding targets.

use crate::{BoundingBox, HazardPrepError, HazardPrepResult};
use serde::{Deserialize, Serialize};

/// A regular grid of square cells anchored at its lower-left corner.
///
/// Cells are ordered x-outer, y-inner: the flat index of cell `(ix, iy)` is
/// `ix * ny + iy`. Every cell is half-open, `[x0, x0 + cell_size)` by
/// `[y0, y0 + cell_size)`, so a point belongs to exactly one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Lower-left corner X of the first cell
    pub min_x: f64,
    /// Lower-left corner Y of the first cell
    pub min_y: f64,
    /// Edge length of a cell in CRS units
    pub cell_size: f64,
    /// Number of cells in X direction
    pub nx: usize,
    /// Number of cells in Y direction
    pub ny: usize,
}

impl GridSpec {
    /// Build the grid covering `extent`.
    ///
    /// Cell origins run from `min` to `max` inclusive, so the last row and
    /// column of cells extend past the extent's upper edge.
    pub fn from_extent(extent: &BoundingBox, cell_size: f64) -> HazardPrepResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(HazardPrepError::InvalidGrid(format!(
                "cell size must be positive, got {}",
                cell_size
            )));
        }
        if extent.width() < 0.0 || extent.height() < 0.0 {
            return Err(HazardPrepError::InvalidExtent(format!("{:?}", extent)));
        }

        Ok(Self {
            min_x: extent.min_x,
            min_y: extent.min_y,
            cell_size,
            nx: axis_count(extent.min_x, extent.max_x, cell_size),
            ny: axis_count(extent.min_y, extent.max_y, cell_size),
        })
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// Split a flat cell index into `(ix, iy)`.
    pub fn unflatten(&self, index: usize) -> (usize, usize) {
        (index / self.ny, index % self.ny)
    }

    /// Bounds of cell `index`.
    pub fn cell_bounds(&self, index: usize) -> BoundingBox {
        let (ix, iy) = self.unflatten(index);
        let x0 = self.min_x + ix as f64 * self.cell_size;
        let y0 = self.min_y + iy as f64 * self.cell_size;
        BoundingBox::new(x0, y0, x0 + self.cell_size, y0 + self.cell_size)
    }

    /// Centre of cell `index`.
    pub fn cell_center(&self, index: usize) -> (f64, f64) {
        let (ix, iy) = self.unflatten(index);
        (
            self.min_x + (ix as f64 + 0.5) * self.cell_size,
            self.min_y + (iy as f64 + 0.5) * self.cell_size,
        )
    }

    /// Centres of all cells in flat index order.
    pub fn cell_centers(&self) -> Vec<(f64, f64)> {
        (0..self.len()).map(|i| self.cell_center(i)).collect()
    }

    /// Find the cell containing `(x, y)`.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let fx = ((x - self.min_x) / self.cell_size).floor();
        let fy = ((y - self.min_y) / self.cell_size).floor();
        if fx < 0.0 || fy < 0.0 {
            return None;
        }

        let (ix, iy) = (fx as usize, fy as usize);
        if ix >= self.nx || iy >= self.ny {
            return None;
        }
        Some(ix * self.ny + iy)
    }

    /// Total area covered by the cells.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_x,
            self.min_y,
            self.min_x + self.nx as f64 * self.cell_size,
            self.min_y + self.ny as f64 * self.cell_size,
        )
    }
}

/// Length of `arange(min, max + step, step)`.
fn axis_count(min: f64, max: f64, step: f64) -> usize {
    let n = ((max + step - min) / step - 1e-9).ceil();
    if n < 0.0 {
        0
    } else {
        n as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lv95_extent() -> BoundingBox {
        BoundingBox::new(2255000.0, 840000.0, 2964000.0, 1479000.0)
    }

    #[test]
    fn test_lv95_cell_counts() {
        let grid = GridSpec::from_extent(&lv95_extent(), 1000.0).unwrap();
        assert_eq!(grid.nx, 710);
        assert_eq!(grid.ny, 640);

        let grid = GridSpec::from_extent(&lv95_extent(), 2000.0).unwrap();
        assert_eq!(grid.nx, 356);
        assert_eq!(grid.ny, 321);
    }

    #[test]
    fn test_cell_order_is_x_outer() {
        let grid = GridSpec::from_extent(&BoundingBox::new(0.0, 0.0, 2.0, 1.0), 1.0).unwrap();
        assert_eq!((grid.nx, grid.ny), (3, 2));
        assert_eq!(grid.cell_center(0), (0.5, 0.5));
        assert_eq!(grid.cell_center(1), (0.5, 1.5));
        assert_eq!(grid.cell_center(2), (1.5, 0.5));
        assert_eq!(grid.unflatten(5), (2, 1));
    }

    #[test]
    fn test_locate_half_open() {
        let grid = GridSpec::from_extent(&BoundingBox::new(0.0, 0.0, 2.0, 2.0), 1.0).unwrap();
        assert_eq!(grid.locate(0.0, 0.0), Some(0));
        assert_eq!(grid.locate(1.0, 0.5), Some(grid.ny));
        assert_eq!(grid.locate(2.999, 2.999), Some(grid.len() - 1));
        assert_eq!(grid.locate(3.0, 0.5), None);
        assert_eq!(grid.locate(-0.001, 0.5), None);
        assert_eq!(grid.locate(f64::NAN, 0.5), None);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(GridSpec::from_extent(&lv95_extent(), 0.0).is_err());
        assert!(GridSpec::from_extent(&lv95_extent(), -5.0).is_err());
    }
}
