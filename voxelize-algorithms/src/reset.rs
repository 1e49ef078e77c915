use rayon::prelude::*;
use voxelize_core::{
    containers::{AccumulatorGrid, PointIndexBuffer},
    math::GridShape,
};

/// Marks every slot of `point_indices` as unassigned by setting it to the sentinel of `shape`. This covers all
/// slots including the guard slot, regardless of how many points the previous batch had. Must run before every
/// [scatter](crate::scatter::scatter_points), otherwise stale indices of the previous batch would be read as
/// valid.
///
/// ```
/// # use voxelize_algorithms::reset::reset_point_index;
/// # use voxelize_core::{containers::PointIndexBuffer, math::GridShape};
/// let old_shape = GridShape::new(&[2, 2]).unwrap();
/// let mut point_indices = PointIndexBuffer::new(2, &old_shape);
/// point_indices.as_mut_slice()[0] = 1;
///
/// let shape = GridShape::new(&[3, 3]).unwrap();
/// reset_point_index(&mut point_indices, &shape);
/// assert_eq!(&[9, 9, 9], point_indices.as_slice());
/// ```
pub fn reset_point_index(point_indices: &mut PointIndexBuffer, shape: &GridShape) {
    let sentinel = shape.sentinel();
    point_indices.set_sentinel(sentinel);
    point_indices
        .as_mut_slice()
        .par_iter_mut()
        .for_each(|slot| *slot = sentinel);
}

/// Clears the cells of `grid` listed in `unique_indices`, restoring them to the state of an empty grid. Cells not in
/// the list are left untouched, so the cost is proportional to the number of occupied cells and not to the volume
/// of the grid.
///
/// Must run after the voxels of the same batch have been [gathered](crate::gather::gather_voxels), since it
/// destroys the accumulated values. Listing a cell more than once is harmless.
///
/// ```
/// # use voxelize_algorithms::reset::reset_grid;
/// # use voxelize_core::{containers::AccumulatorGrid, math::GridShape};
/// let grid = AccumulatorGrid::new(GridShape::new(&[2, 2]).unwrap(), 1).unwrap();
/// grid.accumulate(0, &[1.0]);
/// grid.accumulate(3, &[5.0]);
///
/// reset_grid(&grid, &[0, 3]);
/// assert!(grid.is_empty());
/// ```
///
/// # Panics
///
/// If any index in `unique_indices` is out of bounds for `grid`
pub fn reset_grid(grid: &AccumulatorGrid, unique_indices: &[usize]) {
    unique_indices
        .par_iter()
        .for_each(|&index| grid.clear_cell(index));
}
