use voxelize_core::math::GridShape;

/// Configuration of a [Voxelizer](crate::pipeline::Voxelizer).
///
/// With the `serde` feature enabled, the configuration can be (de)serialized. The grid shape is written as a plain
/// list of axis sizes, and `check_bounds` may be omitted, in which case it defaults to `true`:
///
/// ```json
/// { "grid_shape": [41, 1600, 1408], "num_features": 4, "max_points": 150000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelizerConfig {
    /// Shape of the dense grid that points are scattered into
    pub grid_shape: GridShape,
    /// Length of the feature vector of every point
    pub num_features: usize,
    /// Maximum number of points per batch
    pub max_points: usize,
    /// If true, the voxelizer checks every batch for coordinates outside of the grid and for unique cell lists that
    /// violate their contract, and reports an error instead of accumulating into the wrong cells. The stage
    /// functions themselves never check coordinates
    #[cfg_attr(feature = "serde", serde(default = "default_check_bounds"))]
    pub check_bounds: bool,
}

impl VoxelizerConfig {
    /// Creates a new configuration with bounds checking enabled
    pub fn new(grid_shape: GridShape, num_features: usize, max_points: usize) -> Self {
        Self {
            grid_shape,
            num_features,
            max_points,
            check_bounds: true,
        }
    }

    /// Enables or disables bounds checking
    pub fn with_check_bounds(mut self, check_bounds: bool) -> Self {
        self.check_bounds = check_bounds;
        self
    }
}

#[cfg(feature = "serde")]
fn default_check_bounds() -> bool {
    true
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_default_bounds_check() {
        let config: VoxelizerConfig = serde_json::from_str(
            r#"{ "grid_shape": [41, 1600, 1408], "num_features": 4, "max_points": 150000 }"#,
        )
        .unwrap();
        assert_eq!(
            VoxelizerConfig::new(GridShape::new(&[41, 1600, 1408]).unwrap(), 4, 150000),
            config
        );
    }

    #[test]
    fn test_deserialize_rejects_invalid_grid_shape() {
        let result = serde_json::from_str::<VoxelizerConfig>(
            r#"{ "grid_shape": [41, 0], "num_features": 4, "max_points": 10 }"#,
        );
        assert!(result.is_err());
    }
}
