use anyhow::{bail, Result};
use nalgebra::{Point3, Vector3};

use super::{GridShape, AABB};

/// Describes how continuous 3D positions are quantized into the cells of a voxel grid: a bounding box that the
/// grid covers, and the edge lengths of a single voxel.
///
/// With [new](VoxelGridSpec::new), the number of voxels along each axis is `round(extent / voxel_size)`, with
/// [covering](VoxelGridSpec::covering) it is `ceil(extent / voxel_size)`, but at least one in both cases. A position
/// `p` falls into the voxel `floor((p - bounds.min) / voxel_size)` along every axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelGridSpec {
    bounds: AABB,
    voxel_size: Vector3<f64>,
    shape: GridShape,
}

impl VoxelGridSpec {
    /// Creates a new `VoxelGridSpec`. Fails if any component of `voxel_size` is not a positive finite number, or
    /// if the resulting grid has too many cells to be addressed
    ///
    /// Example:
    /// ```
    /// # use voxelize_core::math::*;
    /// # use voxelize_core::nalgebra::{Point3, Vector3};
    /// let bounds = AABB::from_min_max(Point3::new(0.0, -40.0, -3.0), Point3::new(70.4, 40.0, 1.0));
    /// let spec = VoxelGridSpec::new(bounds, Vector3::new(0.05, 0.05, 0.1)).unwrap();
    /// assert_eq!(&[1408, 1600, 40], spec.grid_shape().dims());
    /// ```
    pub fn new(bounds: AABB, voxel_size: Vector3<f64>) -> Result<Self> {
        Self::with_cell_counts(bounds, voxel_size, f64::round)
    }

    /// Creates a `VoxelGridSpec` whose voxels cover all of `bounds`, so every position inside `bounds` except those
    /// on its maximum boundary has a voxel. Unlike [new](VoxelGridSpec::new), the voxel count per axis is rounded
    /// up, so the grid may reach past `bounds.max()`. Use this for bounds computed from the points themselves
    ///
    /// ```
    /// # use voxelize_core::math::*;
    /// # use voxelize_core::nalgebra::{Point3, Vector3};
    /// let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(2.4, 1.0, 1.0));
    /// let spec = VoxelGridSpec::covering(bounds, Vector3::new(1.0, 1.0, 1.0)).unwrap();
    /// assert_eq!(&[3, 1, 1], spec.grid_shape().dims());
    /// assert_eq!(Some([2, 0, 0]), spec.voxel_coordinate(&Point3::new(2.3, 0.5, 0.5)));
    /// ```
    pub fn covering(bounds: AABB, voxel_size: Vector3<f64>) -> Result<Self> {
        Self::with_cell_counts(bounds, voxel_size, f64::ceil)
    }

    fn with_cell_counts(
        bounds: AABB,
        voxel_size: Vector3<f64>,
        to_cell_count: fn(f64) -> f64,
    ) -> Result<Self> {
        if voxel_size.iter().any(|&size| !size.is_finite() || size <= 0.0) {
            bail!(
                "VoxelGridSpec: Voxel size must be positive on every axis (got {})",
                voxel_size.transpose()
            );
        }
        let extent = bounds.extent();
        let mut cells = [1; 3];
        for (axis, count) in cells.iter_mut().enumerate() {
            *count = usize::max(to_cell_count(extent[axis] / voxel_size[axis]) as usize, 1);
        }
        let shape = GridShape::new(&cells)?;
        Ok(Self {
            bounds,
            voxel_size,
            shape,
        })
    }

    /// The region covered by the voxel grid
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Edge lengths of a single voxel
    pub fn voxel_size(&self) -> &Vector3<f64> {
        &self.voxel_size
    }

    /// The shape of the dense grid described by this `VoxelGridSpec`, with the axes in X, Y, Z order
    pub fn grid_shape(&self) -> &GridShape {
        &self.shape
    }

    /// Returns the grid coordinate of the voxel that contains `position`, or `None` if `position` is outside of the
    /// grid
    ///
    /// ```
    /// # use voxelize_core::math::*;
    /// # use voxelize_core::nalgebra::{Point3, Vector3};
    /// let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 2.0));
    /// let spec = VoxelGridSpec::new(bounds, Vector3::new(1.0, 1.0, 1.0)).unwrap();
    /// assert_eq!(Some([3, 0, 1]), spec.voxel_coordinate(&Point3::new(3.5, 0.2, 1.9)));
    /// assert_eq!(None, spec.voxel_coordinate(&Point3::new(-0.1, 0.2, 1.0)));
    /// ```
    pub fn voxel_coordinate(&self, position: &Point3<f64>) -> Option<[usize; 3]> {
        let offset = (position - self.bounds.min()).component_div(&self.voxel_size);
        let mut coord = [0; 3];
        for axis in 0..3 {
            let cell = offset[axis].floor();
            if !(cell >= 0.0 && cell < self.shape.dims()[axis] as f64) {
                return None;
            }
            coord[axis] = cell as usize;
        }
        Some(coord)
    }

    /// Like [voxel_coordinate](VoxelGridSpec::voxel_coordinate), but positions outside of the grid are clamped to
    /// the closest boundary voxel instead of being rejected. Non-finite components map to the first voxel on their
    /// axis
    pub fn voxel_coordinate_clamped(&self, position: &Point3<f64>) -> [usize; 3] {
        let offset = (position - self.bounds.min()).component_div(&self.voxel_size);
        let mut coord = [0; 3];
        for axis in 0..3 {
            let max_cell = (self.shape.dims()[axis] - 1) as f64;
            let cell = offset[axis].floor();
            coord[axis] = if cell.is_nan() {
                0
            } else {
                cell.max(0.0).min(max_cell) as usize
            };
        }
        coord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_spec() -> VoxelGridSpec {
        let bounds = AABB::from_min_max(Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        VoxelGridSpec::new(bounds, Vector3::new(0.5, 0.5, 0.25)).unwrap()
    }

    #[test]
    fn test_grid_shape_rounds_cell_counts() {
        let spec = unit_spec();
        assert_eq!(&[4, 4, 4], spec.grid_shape().dims());

        let flat = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let spec = VoxelGridSpec::new(flat, Vector3::new(0.3, 0.3, 0.3)).unwrap();
        assert_eq!(&[3, 3, 1], spec.grid_shape().dims());
    }

    #[test]
    fn test_covering_grid_rounds_cell_counts_up() {
        let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(2.4, 2.0, 0.0));
        let rounded = VoxelGridSpec::new(bounds, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(&[2, 2, 1], rounded.grid_shape().dims());

        let covering = VoxelGridSpec::covering(bounds, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(&[3, 2, 1], covering.grid_shape().dims());
        // Points past the last full voxel get a voxel of their own instead of being clamped into its neighbor
        assert_eq!([2, 1, 0], covering.voxel_coordinate_clamped(&Point3::new(2.2, 1.5, 0.0)));
        assert_eq!([1, 1, 0], rounded.voxel_coordinate_clamped(&Point3::new(2.2, 1.5, 0.0)));
        // Only the maximum boundary of an axis with an integral ratio falls past the grid
        assert_eq!(None, covering.voxel_coordinate(&Point3::new(2.4, 2.0, 0.0)));
        assert_eq!([2, 1, 0], covering.voxel_coordinate_clamped(&Point3::new(2.4, 2.0, 0.0)));
    }

    #[test]
    fn test_rejects_invalid_voxel_sizes() {
        let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(VoxelGridSpec::new(bounds, Vector3::new(0.0, 1.0, 1.0)).is_err());
        assert!(VoxelGridSpec::new(bounds, Vector3::new(1.0, -1.0, 1.0)).is_err());
        assert!(VoxelGridSpec::new(bounds, Vector3::new(1.0, 1.0, f64::NAN)).is_err());
        assert!(VoxelGridSpec::covering(bounds, Vector3::new(0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_voxel_coordinate() {
        let spec = unit_spec();
        assert_eq!(Some([0, 0, 0]), spec.voxel_coordinate(&Point3::new(-1.0, -1.0, 0.0)));
        assert_eq!(Some([2, 1, 3]), spec.voxel_coordinate(&Point3::new(0.1, -0.4, 0.8)));
        // The upper boundary belongs to no voxel
        assert_eq!(None, spec.voxel_coordinate(&Point3::new(1.0, 0.0, 0.5)));
        assert_eq!(None, spec.voxel_coordinate(&Point3::new(0.0, f64::NAN, 0.5)));
    }

    #[test]
    fn test_voxel_coordinate_clamped() {
        let spec = unit_spec();
        assert_eq!([3, 0, 3], spec.voxel_coordinate_clamped(&Point3::new(5.0, -7.0, 1.0)));
        assert_eq!([2, 1, 3], spec.voxel_coordinate_clamped(&Point3::new(0.1, -0.4, 0.8)));
        assert_eq!([0, 0, 0], spec.voxel_coordinate_clamped(&Point3::new(f64::NAN, -1.0, 0.0)));

        let shape = spec.grid_shape();
        assert!(shape.contains(&spec.voxel_coordinate_clamped(&Point3::new(1e30, 1e30, 1e30))));
    }
}
