use std::time::Instant;

use anyhow::{bail, Result};
use log::{debug, trace};
use rayon::prelude::*;
use voxelize_core::containers::{AccumulatorGrid, PointIndexBuffer, VoxelBuffer};

use crate::{
    config::VoxelizerConfig,
    gather::gather_voxels,
    reset::{reset_grid, reset_point_index},
    scatter::scatter_points,
    unique::{SortedUnique, UniqueIndices},
};

/// Converts batches of points into voxel lists.
///
/// A `Voxelizer` owns the dense [AccumulatorGrid] and the [PointIndexBuffer] and reuses them for every batch. Each
/// call to [voxelize](Voxelizer::voxelize) runs the stages of a batch in order: point index reset, scatter,
/// uniqueness, gather and sparse grid reset. Every stage finishes completely before the next one starts. After a
/// batch, the grid is empty again, while the point indices of the batch stay available through
/// [point_indices](Voxelizer::point_indices) until the next batch.
///
/// The unique occupied cells are computed by a [UniqueIndices] implementation, [SortedUnique] by default.
pub struct Voxelizer<U = SortedUnique> {
    config: VoxelizerConfig,
    grid: AccumulatorGrid,
    point_indices: PointIndexBuffer,
    unique: U,
    num_points: usize,
}

impl Voxelizer<SortedUnique> {
    /// Creates a new `Voxelizer` that orders its voxels by ascending linear cell index
    pub fn new(config: VoxelizerConfig) -> Result<Self> {
        Self::with_unique(config, SortedUnique)
    }
}

impl<U: UniqueIndices> Voxelizer<U> {
    /// Creates a new `Voxelizer` that uses `unique` to find the occupied cells of each batch
    pub fn with_unique(config: VoxelizerConfig, unique: U) -> Result<Self> {
        if config.max_points.checked_add(1).is_none() {
            bail!(
                "Maximum batch size of {} points leaves no room for the guard slot",
                config.max_points
            );
        }
        let grid = AccumulatorGrid::new(config.grid_shape.clone(), config.num_features)?;
        let point_indices = PointIndexBuffer::new(config.max_points, &config.grid_shape);
        debug!(
            "Created voxelizer for grid {} ({} cells) with {} features per cell and room for {} points",
            config.grid_shape,
            config.grid_shape.volume(),
            config.num_features,
            config.max_points
        );
        Ok(Self {
            config,
            grid,
            point_indices,
            unique,
            num_points: 0,
        })
    }

    /// The configuration of this `Voxelizer`
    pub fn config(&self) -> &VoxelizerConfig {
        &self.config
    }

    /// The accumulator grid of this `Voxelizer`. Empty between batches
    pub fn grid(&self) -> &AccumulatorGrid {
        &self.grid
    }

    /// The cell index of every point of the most recent successful batch, in point order. Empty after a failed
    /// batch
    pub fn point_indices(&self) -> &[usize] {
        &self.point_indices.as_slice()[..self.num_points]
    }

    /// Voxelizes one batch of points and returns the voxels.
    ///
    /// `features` holds `config().num_features` values per point and `coords` holds one grid coordinate per point.
    /// Fails if the buffers do not describe the same number of points, if the batch exceeds `max_points`, or, when
    /// `check_bounds` is enabled, if any coordinate lies outside of the grid or if the unique cell list does not name
    /// every occupied cell exactly once. A failed batch leaves the grid empty.
    ///
    /// ```
    /// # use voxelize_algorithms::{config::VoxelizerConfig, pipeline::Voxelizer};
    /// # use voxelize_core::math::GridShape;
    /// let config = VoxelizerConfig::new(GridShape::new(&[4, 4]).unwrap(), 2, 8);
    /// let mut voxelizer = Voxelizer::new(config).unwrap();
    ///
    /// let voxels = voxelizer.voxelize(&[1.0, 2.0, 3.0, 4.0], &[3, 1, 3, 1]).unwrap();
    /// assert_eq!(1, voxels.len());
    /// assert_eq!(&[2.0, 3.0], voxels.voxel(0).features);
    /// assert_eq!(&[13, 13], voxelizer.point_indices());
    ///
    /// // Coordinate (4, 0) is outside of the grid
    /// assert!(voxelizer.voxelize(&[1.0, 1.0], &[4, 0]).is_err());
    /// ```
    pub fn voxelize(&mut self, features: &[f32], coords: &[usize]) -> Result<VoxelBuffer> {
        let mut voxels = VoxelBuffer::new(self.config.num_features, self.config.grid_shape.ndim());
        self.voxelize_into(features, coords, &mut voxels)?;
        Ok(voxels)
    }

    /// Like [voxelize](Voxelizer::voxelize), but writes the voxels into an existing `VoxelBuffer`, which is resized to
    /// the number of occupied cells. Fails if the feature width or number of axes of `voxels` do not match the
    /// configuration
    pub fn voxelize_into(
        &mut self,
        features: &[f32],
        coords: &[usize],
        voxels: &mut VoxelBuffer,
    ) -> Result<()> {
        let t_start = Instant::now();
        self.num_points = 0;
        let num_points = self.validate_batch(features, coords)?;
        if voxels.num_features() != self.config.num_features
            || voxels.ndim() != self.config.grid_shape.ndim()
        {
            bail!(
                "Voxel buffer with {} features and {} axes does not match the voxelizer configuration ({} features, {} axes)",
                voxels.num_features(),
                voxels.ndim(),
                self.config.num_features,
                self.config.grid_shape.ndim()
            );
        }

        reset_point_index(&mut self.point_indices, &self.config.grid_shape);
        scatter_points(features, coords, &self.grid, &mut self.point_indices);
        trace!("Scattered {} points", num_points);

        let point_indices = &self.point_indices.as_slice()[..num_points];
        let unique = self
            .unique
            .unique_indices(point_indices, self.config.grid_shape.sentinel());
        if self.config.check_bounds {
            if let Err(err) = self.validate_unique(&unique, num_points) {
                // Nothing was gathered, so every cell this batch touched has to be cleared
                reset_grid(&self.grid, point_indices);
                return Err(err);
            }
        }
        trace!("Found {} occupied cells", unique.len());

        voxels.resize(unique.len());
        gather_voxels(&self.grid, &unique, voxels);
        reset_grid(&self.grid, &unique);
        self.num_points = num_points;

        debug!(
            "Voxelized {} points into {} voxels in {:.3}ms",
            num_points,
            unique.len(),
            t_start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Checks the shapes of the input buffers and returns the number of points in the batch
    fn validate_batch(&self, features: &[f32], coords: &[usize]) -> Result<usize> {
        let shape = &self.config.grid_shape;
        let ndim = shape.ndim();
        if coords.len() % ndim != 0 {
            bail!(
                "Coordinate buffer has {} values, which is not a multiple of the {} grid axes",
                coords.len(),
                ndim
            );
        }
        let num_points = coords.len() / ndim;
        if features.len() != num_points * self.config.num_features {
            bail!(
                "Feature buffer has {} values, but {} points with {} features each need {}",
                features.len(),
                num_points,
                self.config.num_features,
                num_points * self.config.num_features
            );
        }
        if num_points > self.config.max_points {
            bail!(
                "Batch of {} points exceeds the maximum of {} points",
                num_points,
                self.config.max_points
            );
        }

        if self.config.check_bounds {
            if let Some(point) = coords
                .par_chunks_exact(ndim)
                .position_first(|coord| !shape.contains(coord))
            {
                bail!(
                    "Coordinate {:?} of point {} is outside of grid {}",
                    &coords[point * ndim..(point + 1) * ndim],
                    point,
                    shape
                );
            }
        }
        Ok(num_points)
    }

    /// Checks that the unique indices name every occupied cell of the batch exactly once
    fn validate_unique(&self, unique: &[usize], num_points: usize) -> Result<()> {
        let shape = &self.config.grid_shape;
        let volume = shape.volume();
        let grid = &self.grid;
        if let Some(&index) = unique
            .par_iter()
            .find_first(|&&index| index >= volume || grid.cell_count(index) == 0)
        {
            bail!(
                "Unique cell list contains index {}, which is not an occupied cell of grid {}",
                index,
                shape
            );
        }

        let mut sorted = unique.to_vec();
        sorted.par_sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("Unique cell list contains index {} more than once", pair[0]);
        }

        // With every listed cell distinct and occupied, the counts only add up if no occupied cell is missing
        let listed_points = unique
            .par_iter()
            .map(|&index| grid.cell_count(index) as usize)
            .sum::<usize>();
        if listed_points != num_points {
            bail!(
                "Unique cell list covers {} of the {} points in the batch",
                listed_points,
                num_points
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unique::{FirstSeenUnique, SortedUnique};
    use voxelize_core::math::GridShape;

    fn config_2x2(max_points: usize) -> VoxelizerConfig {
        VoxelizerConfig::new(GridShape::new(&[2, 2]).unwrap(), 1, max_points)
    }

    #[test]
    fn test_voxelize_reference_scenario() {
        let mut voxelizer = Voxelizer::new(config_2x2(3)).unwrap();
        let voxels = voxelizer
            .voxelize(&[1.0, 3.0, 5.0], &[0, 0, 0, 0, 1, 1])
            .unwrap();

        assert_eq!(&[0, 0, 3], voxelizer.point_indices());
        assert_eq!(2, voxels.len());
        assert_eq!(&[2.0], voxels.voxel(0).features);
        assert_eq!(&[0, 0], voxels.voxel(0).coord);
        assert_eq!(&[5.0], voxels.voxel(1).features);
        assert_eq!(&[1, 1], voxels.voxel(1).coord);
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_consecutive_batches_do_not_leak() {
        let mut voxelizer = Voxelizer::new(config_2x2(4)).unwrap();
        voxelizer
            .voxelize(&[1.0, 3.0, 5.0, 7.0], &[0, 0, 0, 1, 1, 0, 1, 1])
            .unwrap();
        let voxels = voxelizer.voxelize(&[10.0], &[0, 1]).unwrap();

        assert_eq!(&[10.0], voxels.features());
        assert_eq!(&[0, 1], voxels.coords());
        assert_eq!(&[1], voxelizer.point_indices());
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_custom_collaborator_determines_voxel_order() {
        let mut voxelizer = Voxelizer::with_unique(config_2x2(3), FirstSeenUnique).unwrap();
        let voxels = voxelizer
            .voxelize(&[5.0, 1.0, 3.0], &[1, 1, 0, 0, 0, 0])
            .unwrap();
        assert_eq!(&[5.0, 2.0], voxels.features());
        assert_eq!(&[1, 1, 0, 0], voxels.coords());
    }

    #[test]
    fn test_rejects_malformed_batches() {
        let mut voxelizer = Voxelizer::new(config_2x2(2)).unwrap();
        // Odd number of coordinate values for a 2D grid
        assert!(voxelizer.voxelize(&[1.0], &[0, 0, 1]).is_err());
        // Feature count does not match point count
        assert!(voxelizer.voxelize(&[1.0, 2.0], &[0, 0]).is_err());
        // Too many points
        assert!(voxelizer
            .voxelize(&[1.0, 2.0, 3.0], &[0, 0, 0, 1, 1, 0])
            .is_err());
        // Out of bounds
        assert!(voxelizer.voxelize(&[1.0], &[0, 2]).is_err());
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_rejects_unique_lists_with_empty_cells() {
        let bogus = |_: &[usize], _: usize| vec![0, 2];
        let mut voxelizer = Voxelizer::with_unique(config_2x2(2), bogus).unwrap();
        assert!(voxelizer.voxelize(&[1.0, 2.0], &[0, 0, 1, 1]).is_err());
        // The failed batch must not leave anything behind in the grid
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_rejects_unique_lists_missing_a_cell() {
        let drop_last = |indices: &[usize], sentinel: usize| {
            let mut unique = SortedUnique.unique_indices(indices, sentinel);
            unique.pop();
            unique
        };
        let mut voxelizer = Voxelizer::with_unique(config_2x2(2), drop_last).unwrap();
        assert!(voxelizer.voxelize(&[1.0, 2.0], &[0, 0, 1, 1]).is_err());
        assert!(voxelizer.grid().is_empty());
        assert!(voxelizer.point_indices().is_empty());

        // Nothing of the rejected batch shows up in the next one
        let _ = voxelizer.voxelize(&[4.0, 8.0], &[1, 1, 1, 1]);
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_rejects_unique_lists_with_duplicates() {
        let duplicate = |_: &[usize], _: usize| vec![0, 0];
        let mut voxelizer = Voxelizer::with_unique(config_2x2(2), duplicate).unwrap();
        assert!(voxelizer.voxelize(&[1.0, 2.0], &[0, 0, 0, 0]).is_err());
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_failed_batch_clears_point_indices() {
        let mut voxelizer = Voxelizer::new(config_2x2(2)).unwrap();
        voxelizer.voxelize(&[1.0], &[1, 0]).unwrap();
        assert_eq!(&[2], voxelizer.point_indices());
        assert!(voxelizer.voxelize(&[1.0], &[2, 0]).is_err());
        assert!(voxelizer.point_indices().is_empty());

        let bogus = |_: &[usize], _: usize| vec![3];
        let mut voxelizer = Voxelizer::with_unique(config_2x2(2), bogus).unwrap();
        assert!(voxelizer.voxelize(&[1.0], &[0, 1]).is_err());
        assert!(voxelizer.point_indices().is_empty());
    }

    #[test]
    fn test_rejects_capacity_without_room_for_guard_slot() {
        let config = config_2x2(usize::MAX);
        assert!(Voxelizer::new(config).is_err());
    }

    #[test]
    fn test_unchecked_gather_of_empty_cell_yields_nan() {
        let bogus = |_: &[usize], _: usize| vec![0, 2];
        let config = config_2x2(2).with_check_bounds(false);
        let mut voxelizer = Voxelizer::with_unique(config, bogus).unwrap();
        let voxels = voxelizer.voxelize(&[4.0], &[0, 0]).unwrap();
        assert_eq!(&[4.0], voxels.voxel(0).features);
        assert!(voxels.voxel(1).features[0].is_nan());
        assert!(voxelizer.grid().is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let mut voxelizer = Voxelizer::new(config_2x2(2)).unwrap();
        let voxels = voxelizer.voxelize(&[], &[]).unwrap();
        assert!(voxels.is_empty());
        assert!(voxelizer.point_indices().is_empty());
    }

    #[test]
    fn test_voxelize_into_checks_output_layout() {
        let mut voxelizer = Voxelizer::new(config_2x2(2)).unwrap();
        let mut voxels = VoxelBuffer::new(2, 2);
        assert!(voxelizer
            .voxelize_into(&[1.0], &[0, 0], &mut voxels)
            .is_err());

        let mut voxels = VoxelBuffer::with_len(10, 1, 2);
        voxelizer
            .voxelize_into(&[1.0], &[0, 0], &mut voxels)
            .unwrap();
        assert_eq!(1, voxels.len());
    }
}
