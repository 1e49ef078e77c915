#![warn(clippy::all)]
//! Algorithms that turn point clouds into voxel lists.
//!
//! Voxelizing a batch of points runs four stages in a fixed order, each of them data-parallel:
//! 1) [reset_point_index](reset::reset_point_index) marks every per-point slot as unassigned
//! 2) [scatter_points](scatter::scatter_points) adds every point to the grid cell it falls into
//! 3) [gather_voxels](gather::gather_voxels) computes the mean features of every occupied cell
//! 4) [reset_grid](reset::reset_grid) clears the occupied cells for the next batch
//!
//! Between scatter and gather, an implementation of [UniqueIndices](unique::UniqueIndices) turns the per-point cell
//! indices into the list of occupied cells. The [Voxelizer](pipeline::Voxelizer) owns all buffers and runs the
//! stages in order:
//!
//! ```
//! # use voxelize_algorithms::{config::VoxelizerConfig, pipeline::Voxelizer};
//! # use voxelize_core::math::GridShape;
//! let config = VoxelizerConfig::new(GridShape::new(&[2, 2]).unwrap(), 1, 16);
//! let mut voxelizer = Voxelizer::new(config).unwrap();
//!
//! let features = [1.0, 3.0, 5.0];
//! let coords = [0, 0, 0, 0, 1, 1];
//! let voxels = voxelizer.voxelize(&features, &coords).unwrap();
//!
//! assert_eq!(&[2.0, 5.0], voxels.features());
//! assert_eq!(&[0, 0, 1, 1], voxels.coords());
//! ```

// The Voxelizer, which owns the scratch buffers and runs all stages of a batch in order.
pub mod pipeline;
// Configuration of a Voxelizer.
pub mod config;
// The scatter stage, accumulating points into the dense grid.
pub mod scatter;
// The gather stage, computing the mean feature vector and the coordinate of every occupied cell.
pub mod gather;
// Resetting the per-point indices before a batch and the occupied grid cells after it.
pub mod reset;
// Turning per-point cell indices into the list of unique occupied cells.
pub mod unique;
