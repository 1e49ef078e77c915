use std::convert::TryInto;

use rayon::prelude::*;
use voxelize_core::containers::{AccumulatorGrid, VoxelBuffer};

/// Gathers the occupied cells of `grid` into the compact `voxels` list.
///
/// For every entry `i` of `unique_indices`, voxel `i` receives the mean feature vector of the cell (its feature sum
/// divided by its point count) and the grid coordinate decoded from the cell index. Every entry is processed by an
/// independent parallel task. Since the indices are unique, each task writes to its own voxel and reads from its own
/// cell, so no synchronization is needed. The output order is the order of `unique_indices`.
///
/// Every index in `unique_indices` must be a cell with at least one point. Gathering an empty cell divides by zero
/// and yields non-finite features for that voxel, it does not panic.
///
/// # Examples
///
/// ```
/// # use voxelize_algorithms::gather::gather_voxels;
/// # use voxelize_core::{containers::*, math::GridShape};
/// let grid = AccumulatorGrid::new(GridShape::new(&[2, 2]).unwrap(), 1).unwrap();
/// grid.accumulate(0, &[1.0]);
/// grid.accumulate(0, &[3.0]);
/// grid.accumulate(3, &[5.0]);
///
/// let mut voxels = VoxelBuffer::with_len(2, 1, 2);
/// gather_voxels(&grid, &[0, 3], &mut voxels);
/// assert_eq!(&[2.0, 5.0], voxels.features());
/// assert_eq!(&[0, 0, 1, 1], voxels.coords());
/// ```
///
/// # Panics
///
/// If `voxels` does not hold exactly one voxel per entry of `unique_indices`, if its feature width or number of
/// axes differ from those of `grid`, or if an index is out of bounds for `grid`.
pub fn gather_voxels(grid: &AccumulatorGrid, unique_indices: &[usize], voxels: &mut VoxelBuffer) {
    let shape = grid.shape();
    if voxels.num_features() != grid.num_features() || voxels.ndim() != shape.ndim() {
        panic!(
            "gather_voxels: Voxel buffer with {} features and {} axes does not match grid {} with {} features",
            voxels.num_features(),
            voxels.ndim(),
            shape,
            grid.num_features()
        );
    }
    if voxels.len() != unique_indices.len() {
        panic!(
            "gather_voxels: Voxel buffer holds {} voxels, but {} cells are to be gathered",
            voxels.len(),
            unique_indices.len()
        );
    }

    match grid.num_features() {
        0 => gather_coords_only(grid, unique_indices, voxels),
        1 => gather_fixed::<1>(grid, unique_indices, voxels),
        2 => gather_fixed::<2>(grid, unique_indices, voxels),
        3 => gather_fixed::<3>(grid, unique_indices, voxels),
        4 => gather_fixed::<4>(grid, unique_indices, voxels),
        _ => gather_dynamic(grid, unique_indices, voxels),
    }
}

fn gather_coords_only(grid: &AccumulatorGrid, unique_indices: &[usize], voxels: &mut VoxelBuffer) {
    let shape = grid.shape();
    voxels
        .coords_mut()
        .par_chunks_mut(shape.ndim())
        .zip(unique_indices.par_iter())
        .for_each(|(coord, &index)| shape.decode(index, coord));
}

fn gather_fixed<const F: usize>(
    grid: &AccumulatorGrid,
    unique_indices: &[usize],
    voxels: &mut VoxelBuffer,
) {
    let shape = grid.shape();
    let (features, coords) = voxels.as_mut_parts();
    features
        .par_chunks_mut(F)
        .zip(coords.par_chunks_mut(shape.ndim()))
        .zip(unique_indices.par_iter())
        .for_each(|((mean, coord), &index)| {
            let mean: &mut [f32; F] = mean
                .try_into()
                .expect("voxel buffer holds exactly F features per voxel");
            grid.cell_mean_fixed(index, mean);
            shape.decode(index, coord);
        });
}

fn gather_dynamic(grid: &AccumulatorGrid, unique_indices: &[usize], voxels: &mut VoxelBuffer) {
    let shape = grid.shape();
    let num_features = grid.num_features();
    let (features, coords) = voxels.as_mut_parts();
    features
        .par_chunks_mut(num_features)
        .zip(coords.par_chunks_mut(shape.ndim()))
        .zip(unique_indices.par_iter())
        .for_each(|((mean, coord), &index)| {
            grid.cell_mean(index, mean);
            shape.decode(index, coord);
        });
}
