//! Grid construction against the predefined CRS extents.

use hazard_common::{BoundingBox, CrsCode, GridSpec};

#[test]
fn test_lv95_grid_covers_national_extent() {
    let extent = CrsCode::Epsg2056.default_extent().unwrap();
    let grid = GridSpec::from_extent(&extent, 8000.0).unwrap();

    let covered = grid.bbox();
    assert!(covered.min_x <= extent.min_x);
    assert!(covered.min_y <= extent.min_y);
    assert!(covered.max_x >= extent.max_x);
    assert!(covered.max_y >= extent.max_y);

    // Bern (2600000, 1200000) falls inside exactly one cell.
    let cell = grid.locate(2600000.0, 1200000.0).unwrap();
    assert!(grid.cell_bounds(cell).contains_point(2600000.0, 1200000.0));
}

#[test]
fn test_every_center_locates_to_its_own_cell() {
    let grid = GridSpec::from_extent(&BoundingBox::new(-10.0, 40.0, 10.0, 50.0), 2.5).unwrap();
    for (i, (x, y)) in grid.cell_centers().into_iter().enumerate() {
        assert_eq!(grid.locate(x, y), Some(i));
    }
}
