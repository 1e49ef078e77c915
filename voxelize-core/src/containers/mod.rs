//! Buffers shared by the voxelization stages.
//!
//! # The buffers of a voxelization batch
//!
//! Converting a batch of points into voxels touches four buffers:
//! 1) An [`AccumulatorGrid`], holding a running feature sum and a point count for every cell of the dense grid.
//!    It is the only buffer that many tasks write to concurrently, so all of its slots are atomics.
//! 2) A [`PointIndexBuffer`], recording for every point the linear index of the cell it was scattered into,
//!    or the grid's sentinel if the point slot was not used in the current batch.
//! 3) The list of unique occupied cell indices, derived from the point indices. This is a plain `&[usize]` and
//!    is produced by a collaborator outside of this crate.
//! 4) A [`VoxelBuffer`], the compact output with one mean feature vector and one grid coordinate per occupied cell.
//!
//! # Reuse across batches
//!
//! The accumulator grid is sized by the volume of the grid, which is usually far larger than the number of
//! occupied cells. It is therefore allocated once and reused: after the voxels of a batch have been gathered,
//! only the cells that were occupied get cleared again (see [`AccumulatorGrid::clear_cell`]). The point index
//! buffer on the other hand is small and gets reset completely at the start of every batch.
//!
//! All multi-dimensional data is stored flat in row-major order: the features of cell `i` occupy the slots
//! `i * F..(i + 1) * F`, the coordinate of voxel `j` occupies `j * D..(j + 1) * D`.

mod atomic;
pub use self::atomic::*;

mod accumulator_grid;
pub use self::accumulator_grid::*;

mod point_index;
pub use self::point_index::*;

mod voxel_buffer;
pub use self::voxel_buffer::*;
