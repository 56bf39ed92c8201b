//! Test data generators for synthetic radar hail fields.
//!
//! Fields are `Vec<f32>` in row-major order (`[row * width + col]`), the
//! layout the radar stacks use. Axes are ascending LV95 coordinates.

/// Creates a single circular hail cell.
///
/// The value falls off linearly from `peak` at `(center_col, center_row)`
/// to zero at `radius` cells; everything outside is exactly zero, like a
/// MESHS field on a quiet day with one storm.
pub fn create_hail_cell(
    width: usize,
    height: usize,
    center_col: usize,
    center_row: usize,
    radius: f32,
    peak: f32,
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_col as f32;
            let dy = row as f32 - center_row as f32;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < radius {
                data[row * width + col] = peak * (1.0 - dist / radius);
            }
        }
    }
    data
}

/// Creates a sparse hail-like field with deterministic pseudo-random values.
///
/// Roughly one cell in eight is non-zero, with values between 20 and 70 mm.
pub fn create_hail_field(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let value = if hash % 8 == 0 {
                20.0 + (hash % 5000) as f32 / 100.0
            } else {
                0.0
            };
            data.push(value);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid with NaN values at specified positions, zeros elsewhere.
///
/// Useful for testing missing data handling.
pub fn create_grid_with_nans(width: usize, height: usize, nan_positions: &[(usize, usize)]) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Ascending radar axis of `n` pixel centres starting at `start`.
///
/// ```
/// use test_utils::radar_axis;
///
/// assert_eq!(radar_axis(2_600_500.0, 1000.0, 3), vec![2_600_500.0, 2_601_500.0, 2_602_500.0]);
/// ```
pub fn radar_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Consecutive daily ordinals starting at `first`.
pub fn daily_ordinals(first: i64, n: usize) -> Vec<i64> {
    (0..n as i64).map(|i| first + i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hail_cell_is_zero_outside() {
        let cell = create_hail_cell(10, 10, 5, 5, 3.0, 60.0);
        assert_eq!(cell[5 * 10 + 5], 60.0);
        assert_eq!(cell[0], 0.0);
        assert!(cell[5 * 10 + 6] > 0.0 && cell[5 * 10 + 6] < 60.0);
    }

    #[test]
    fn test_hail_field_is_deterministic_and_sparse() {
        let a = create_hail_field(50, 50, 7);
        let b = create_hail_field(50, 50, 7);
        assert_eq!(a, b);
        let nonzero = a.iter().filter(|v| **v != 0.0).count();
        assert!(nonzero > 0 && nonzero < a.len() / 2);
        assert!(a.iter().all(|v| *v == 0.0 || (20.0..70.0).contains(v)));
    }

    #[test]
    fn test_grid_with_nans() {
        let grid = create_grid_with_nans(4, 4, &[(1, 2), (9, 9)]);
        assert!(grid[2 * 4 + 1].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_daily_ordinals() {
        assert_eq!(daily_ordinals(737969, 3), vec![737969, 737970, 737971]);
    }
}
