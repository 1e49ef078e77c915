use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{anyhow, Result};
use rayon::prelude::*;

use super::AtomicF32;
use crate::math::GridShape;

/// Dense scratch grid that accumulates the features of all points falling into the same cell.
///
/// For every cell of a [GridShape], the grid stores the component-wise sum of the feature vectors of all points that
/// were added to the cell, plus the number of these points. All slots are atomics and every mutating method takes
/// `&self`, so a single `AccumulatorGrid` can be shared between any number of threads that add points concurrently.
/// Since addition is commutative, the counts after a batch are independent of the order in which points were added,
/// and the sums are equal up to `f32` rounding.
///
/// All loads and stores use `Ordering::Relaxed`. Callers that read the grid after filling it from multiple threads
/// must make sure that all writers have finished, e.g. by joining them (which every `rayon` parallel iterator does
/// before it returns).
///
/// ```
/// # use voxelize_core::containers::AccumulatorGrid;
/// # use voxelize_core::math::GridShape;
/// let grid = AccumulatorGrid::new(GridShape::new(&[2, 2]).unwrap(), 1).unwrap();
/// grid.accumulate(0, &[1.0]);
/// grid.accumulate(0, &[3.0]);
/// grid.accumulate(3, &[5.0]);
/// assert_eq!(vec![2, 0, 0, 1], grid.counts());
/// assert_eq!(vec![4.0, 0.0, 0.0, 5.0], grid.sums());
/// ```
#[derive(Debug)]
pub struct AccumulatorGrid {
    shape: GridShape,
    num_features: usize,
    sums: Vec<AtomicF32>,
    counts: Vec<AtomicU32>,
}

impl AccumulatorGrid {
    /// Creates a new, empty `AccumulatorGrid` with the given shape and `num_features` feature slots per cell. Fails
    /// if the number of feature slots overflows `usize`
    pub fn new(shape: GridShape, num_features: usize) -> Result<Self> {
        let num_slots = shape.volume().checked_mul(num_features).ok_or_else(|| {
            anyhow!(
                "AccumulatorGrid::new: {} features per cell for grid {} overflow usize",
                num_features,
                shape
            )
        })?;
        let sums = std::iter::repeat_with(AtomicF32::default)
            .take(num_slots)
            .collect();
        let counts = std::iter::repeat_with(AtomicU32::default)
            .take(shape.volume())
            .collect();
        Ok(Self {
            shape,
            num_features,
            sums,
            counts,
        })
    }

    /// The shape of this grid
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Length of the feature vector stored per cell
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Adds one point with the given `features` to the cell at the linear `index`: increments the count of the cell
    /// and adds every feature component to the running sum of the cell. Can be called concurrently for the same
    /// cell from any number of threads.
    ///
    /// # Panics
    ///
    /// If `index` is not a valid cell index. `features` must have `num_features()` components, which is only checked
    /// in debug builds.
    pub fn accumulate(&self, index: usize, features: &[f32]) {
        debug_assert_eq!(features.len(), self.num_features);
        self.counts[index].fetch_add(1, Ordering::Relaxed);
        let cell = &self.sums[self.cell_range(index)];
        for (slot, &value) in cell.iter().zip(features.iter()) {
            slot.fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Version of [accumulate](AccumulatorGrid::accumulate) for a feature width that is known at compile time.
    /// `F` must be equal to `num_features()`
    pub fn accumulate_fixed<const F: usize>(&self, index: usize, features: &[f32; F]) {
        debug_assert_eq!(F, self.num_features);
        self.counts[index].fetch_add(1, Ordering::Relaxed);
        let start = index * F;
        let cell = &self.sums[start..start + F];
        for (slot, &value) in cell.iter().zip(features.iter()) {
            slot.fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Number of points in the cell at `index`
    pub fn cell_count(&self, index: usize) -> u32 {
        self.counts[index].load(Ordering::Relaxed)
    }

    /// Writes the feature sum of the cell at `index` into `sum`
    pub fn cell_sum(&self, index: usize, sum: &mut [f32]) {
        for (target, slot) in sum.iter_mut().zip(self.sums[self.cell_range(index)].iter()) {
            *target = slot.load(Ordering::Relaxed);
        }
    }

    /// Writes the mean feature vector of the cell at `index` into `mean`. The mean of an empty cell is `0 / 0`, so
    /// all of its components are NaN
    pub fn cell_mean(&self, index: usize, mean: &mut [f32]) {
        let count = self.cell_count(index) as f32;
        for (target, slot) in mean
            .iter_mut()
            .zip(self.sums[self.cell_range(index)].iter())
        {
            *target = slot.load(Ordering::Relaxed) / count;
        }
    }

    /// Version of [cell_mean](AccumulatorGrid::cell_mean) for a feature width that is known at compile time
    pub fn cell_mean_fixed<const F: usize>(&self, index: usize, mean: &mut [f32; F]) {
        debug_assert_eq!(F, self.num_features);
        let count = self.cell_count(index) as f32;
        let start = index * F;
        let cell = &self.sums[start..start + F];
        for (target, slot) in mean.iter_mut().zip(cell.iter()) {
            *target = slot.load(Ordering::Relaxed) / count;
        }
    }

    /// Resets the count and the feature sum of the cell at `index` to zero
    pub fn clear_cell(&self, index: usize) {
        self.counts[index].store(0, Ordering::Relaxed);
        for slot in &self.sums[self.cell_range(index)] {
            slot.store(0.0, Ordering::Relaxed);
        }
    }

    /// Returns a copy of the point counts of all cells, in linear index order
    pub fn counts(&self) -> Vec<u32> {
        self.counts
            .par_iter()
            .map(|count| count.load(Ordering::Relaxed))
            .collect()
    }

    /// Returns a copy of the feature sums of all cells, in linear index order
    pub fn sums(&self) -> Vec<f32> {
        self.sums
            .par_iter()
            .map(|sum| sum.load(Ordering::Relaxed))
            .collect()
    }

    /// Returns the linear indices of all cells with a nonzero count, in ascending order. This visits every cell of
    /// the grid and is meant for diagnostics, not for the per-batch hot path
    pub fn occupied_cells(&self) -> Vec<usize> {
        self.counts
            .par_iter()
            .enumerate()
            .filter(|(_, count)| count.load(Ordering::Relaxed) > 0)
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns true if every count and every feature sum of this grid is zero. Visits every cell of the grid
    pub fn is_empty(&self) -> bool {
        self.counts
            .par_iter()
            .all(|count| count.load(Ordering::Relaxed) == 0)
            && self
                .sums
                .par_iter()
                .all(|sum| sum.load(Ordering::Relaxed) == 0.0)
    }

    fn cell_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.num_features;
        start..start + self.num_features
    }
}
