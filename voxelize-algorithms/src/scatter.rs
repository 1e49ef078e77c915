use std::convert::TryInto;

use rayon::prelude::*;
use voxelize_core::containers::{AccumulatorGrid, PointIndexBuffer};

/// Scatters a batch of points into `grid`.
///
/// `features` holds the feature vectors of all points (`grid.num_features()` values per point), `coords` holds
/// their grid coordinates (`grid.shape().ndim()` values per point). Every point is processed by an independent
/// parallel task that encodes its coordinate into a linear cell index, atomically adds the point to that cell of
/// `grid` and records the cell index in the point's slot of `point_indices`. Since the accumulation is commutative,
/// the counts in `grid` do not depend on the order in which the tasks run, and the feature sums only up to `f32`
/// rounding.
///
/// `point_indices` has to be reset (see [reset_point_index](crate::reset::reset_point_index)) before calling this
/// function. Slots of points beyond the end of the batch keep the sentinel. An empty batch leaves `grid`
/// untouched.
///
/// The coordinates are not checked. A coordinate outside of the grid adds the point to some other cell or panics
/// once it indexes past the end of `grid`.
///
/// # Examples
///
/// ```
/// # use voxelize_algorithms::{reset::reset_point_index, scatter::scatter_points};
/// # use voxelize_core::{containers::*, math::GridShape};
/// let shape = GridShape::new(&[2, 2]).unwrap();
/// let grid = AccumulatorGrid::new(shape.clone(), 1).unwrap();
/// let mut point_indices = PointIndexBuffer::new(4, &shape);
/// reset_point_index(&mut point_indices, &shape);
///
/// scatter_points(&[1.0, 3.0, 5.0], &[0, 0, 0, 0, 1, 1], &grid, &mut point_indices);
///
/// assert_eq!(vec![2, 0, 0, 1], grid.counts());
/// assert_eq!(vec![4.0, 0.0, 0.0, 5.0], grid.sums());
/// assert_eq!(&[0, 0, 3, 4, 4], point_indices.as_slice());
/// ```
///
/// # Panics
///
/// If the length of `coords` is not a multiple of the number of grid axes, if `features` does not hold exactly
/// `grid.num_features()` values per point, or if the batch has more points than `point_indices` has room for.
pub fn scatter_points(
    features: &[f32],
    coords: &[usize],
    grid: &AccumulatorGrid,
    point_indices: &mut PointIndexBuffer,
) {
    let ndim = grid.shape().ndim();
    let num_features = grid.num_features();
    if coords.len() % ndim != 0 {
        panic!(
            "scatter_points: Coordinate buffer has {} values, which is not a multiple of the {} grid axes",
            coords.len(),
            ndim
        );
    }
    let num_points = coords.len() / ndim;
    if features.len() != num_points * num_features {
        panic!(
            "scatter_points: Expected {} feature values for {} points with {} features each, but got {}",
            num_points * num_features,
            num_points,
            num_features,
            features.len()
        );
    }
    if num_points > point_indices.max_points() {
        panic!(
            "scatter_points: Batch of {} points exceeds the capacity of the point index buffer ({})",
            num_points,
            point_indices.max_points()
        );
    }

    let slots = &mut point_indices.as_mut_slice()[..num_points];
    match num_features {
        1 => scatter_fixed::<1>(features, coords, grid, slots),
        2 => scatter_fixed::<2>(features, coords, grid, slots),
        3 => scatter_fixed::<3>(features, coords, grid, slots),
        4 => scatter_fixed::<4>(features, coords, grid, slots),
        _ => scatter_dynamic(features, coords, grid, slots),
    }
}

fn scatter_fixed<const F: usize>(
    features: &[f32],
    coords: &[usize],
    grid: &AccumulatorGrid,
    slots: &mut [usize],
) {
    let shape = grid.shape();
    slots
        .par_iter_mut()
        .zip(coords.par_chunks_exact(shape.ndim()))
        .zip(features.par_chunks_exact(F))
        .for_each(|((slot, coord), point_features)| {
            let index = shape.encode(coord);
            let point_features: &[f32; F] = point_features
                .try_into()
                .expect("chunks_exact yields chunks of exactly F values");
            grid.accumulate_fixed(index, point_features);
            *slot = index;
        });
}

fn scatter_dynamic(features: &[f32], coords: &[usize], grid: &AccumulatorGrid, slots: &mut [usize]) {
    let shape = grid.shape();
    let num_features = grid.num_features();
    slots
        .par_iter_mut()
        .zip(coords.par_chunks_exact(shape.ndim()))
        .enumerate()
        .for_each(|(point, (slot, coord))| {
            let index = shape.encode(coord);
            grid.accumulate(
                index,
                &features[point * num_features..(point + 1) * num_features],
            );
            *slot = index;
        });
}
