#![warn(clippy::all)]

//! Core data structures for converting point clouds into dense voxel grids
//!
//! `voxelize-core` provides the pieces that the voxelization stages in `voxelize-algorithms` share: the
//! [GridShape](crate::math::GridShape) type, which maps D-dimensional grid coordinates to linear cell indices and back,
//! and the buffers in the [containers](crate::containers) module that the stages read from and write into. The
//! accumulator buffers are built from atomics, so many threads can scatter points into the same cell without locks.

pub extern crate nalgebra;

pub mod containers;
/// Grid shapes, bounding boxes and position quantization
pub mod math;

#[cfg(test)]
pub(crate) mod test_utils;
