//! Shared test utilities for the hazard-prep workspace.
//!
//! Synthetic hail fields, common dates and GeoJSON fixtures, and helpers
//! for tests that read real radar archives.
//!
//! ```ignore
//! use test_utils::{create_hail_cell, dates, require_radar_file};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Path of a radar archive, or return from the test when it is absent.
///
/// ```ignore
/// #[test]
/// fn test_read_meshs() {
///     let path = require_radar_file!("MZC_X1d66_2021.nc");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_radar_file {
    ($name:expr) => {{
        match $crate::radar_archive($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: radar archive '{}' not found, set {}",
                    $name,
                    $crate::RADAR_DIR_ENV
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
