use std::{convert::TryFrom, fmt::Display};

use anyhow::{anyhow, bail, Result};
use itertools::Itertools;

/// Shape of a dense D-dimensional voxel grid together with the row-major codec that maps grid coordinates to
/// linear cell indices.
///
/// The linear index of a coordinate `c` is `Σ c[d] * stride[d]`, where `stride[d]` is the product of the sizes of
/// all axes after `d`. The last axis therefore varies fastest. Every linear index lies in `[0; volume)`, which
/// leaves `volume` itself free to be used as the [sentinel](GridShape::sentinel) for "no cell".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<usize>", into = "Vec<usize>"))]
pub struct GridShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
    volume: usize,
}

impl GridShape {
    /// Creates a new `GridShape` with the given per-axis sizes. Fails if `dims` is empty, if any axis has size
    /// zero, or if the volume of the grid does not fit into a `usize`
    ///
    /// Example:
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 3, 4]).unwrap();
    /// assert_eq!(24, shape.volume());
    /// assert_eq!(&[12, 4, 1], shape.strides());
    ///
    /// assert!(GridShape::new(&[2, 0, 4]).is_err());
    /// ```
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            bail!("GridShape::new: A grid needs at least one axis");
        }
        if let Some(axis) = dims.iter().position(|&size| size == 0) {
            bail!("GridShape::new: Axis {} of grid {:?} has size zero", axis, dims);
        }

        let mut strides = vec![0; dims.len()];
        let mut volume: usize = 1;
        for axis in (0..dims.len()).rev() {
            strides[axis] = volume;
            volume = volume.checked_mul(dims[axis]).ok_or_else(|| {
                anyhow!("GridShape::new: Volume of grid {:?} overflows usize", dims)
            })?;
        }

        Ok(Self {
            dims: dims.to_vec(),
            strides,
            volume,
        })
    }

    /// Number of axes of this grid
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Per-axis sizes of this grid
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Row-major strides of this grid. `strides()[d]` is the distance in linear index space between two cells that
    /// differ by one along axis `d`
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of cells in this grid
    pub fn volume(&self) -> usize {
        self.volume
    }

    /// The reserved out-of-range index that marks "not assigned to any cell". It is equal to the volume of the grid
    /// and is never produced by [encode](GridShape::encode)
    ///
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 2]).unwrap();
    /// assert_eq!(4, shape.sentinel());
    /// ```
    pub fn sentinel(&self) -> usize {
        self.volume
    }

    /// Returns true if `coord` has one component per axis and every component lies within the size of its axis
    pub fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.dims.len()
            && coord
                .iter()
                .zip(self.dims.iter())
                .all(|(&component, &size)| component < size)
    }

    /// Encodes `coord` into its linear cell index.
    ///
    /// The coordinate is not checked (apart from a debug assertion). Encoding a coordinate outside of the grid
    /// yields an index of some other cell or an index `>= volume()`. Use [try_encode](GridShape::try_encode) if
    /// the coordinate comes from an untrusted source
    ///
    /// Example:
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 3, 4]).unwrap();
    /// assert_eq!(0, shape.encode(&[0, 0, 0]));
    /// assert_eq!(1 * 12 + 2 * 4 + 3, shape.encode(&[1, 2, 3]));
    /// ```
    pub fn encode(&self, coord: &[usize]) -> usize {
        debug_assert!(
            self.contains(coord),
            "GridShape::encode: Coordinate {:?} is outside of grid {}",
            coord,
            self
        );
        coord
            .iter()
            .zip(self.strides.iter())
            .map(|(component, stride)| component * stride)
            .sum()
    }

    /// Checked version of [encode](GridShape::encode). Fails if `coord` has the wrong number of components or any
    /// component is out of bounds for its axis
    ///
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 2]).unwrap();
    /// assert_eq!(3, shape.try_encode(&[1, 1]).unwrap());
    /// assert!(shape.try_encode(&[2, 0]).is_err());
    /// assert!(shape.try_encode(&[1]).is_err());
    /// ```
    pub fn try_encode(&self, coord: &[usize]) -> Result<usize> {
        if coord.len() != self.dims.len() {
            bail!(
                "GridShape::try_encode: Coordinate {:?} has {} components but grid {} has {} axes",
                coord,
                coord.len(),
                self,
                self.dims.len()
            );
        }
        for (axis, (&component, &size)) in coord.iter().zip(self.dims.iter()).enumerate() {
            if component >= size {
                bail!(
                    "GridShape::try_encode: Component {} on axis {} is out of bounds for axis size {}",
                    component,
                    axis,
                    size
                );
            }
        }
        Ok(self.encode(coord))
    }

    /// Decodes the linear `index` into its grid coordinate and writes the components into `coord`, which must have
    /// one slot per axis. Inverse of [encode](GridShape::encode) for every index in `[0; volume)`
    ///
    /// Example:
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 3, 4]).unwrap();
    /// let mut coord = [0; 3];
    /// shape.decode(23, &mut coord);
    /// assert_eq!([1, 2, 3], coord);
    /// ```
    pub fn decode(&self, index: usize, coord: &mut [usize]) {
        debug_assert!(
            index < self.volume,
            "GridShape::decode: Index {} is outside of grid {}",
            index,
            self
        );
        debug_assert_eq!(coord.len(), self.dims.len());
        let mut remainder = index;
        for (component, &stride) in coord.iter_mut().zip(self.strides.iter()) {
            *component = remainder / stride;
            remainder %= stride;
        }
    }

    /// Like [decode](GridShape::decode), but returns the coordinate as a new `Vec`
    pub fn decode_to_vec(&self, index: usize) -> Vec<usize> {
        let mut coord = vec![0; self.dims.len()];
        self.decode(index, &mut coord);
        coord
    }

    /// Returns an iterator over all coordinates of this grid, in ascending linear index order
    ///
    /// ```
    /// # use voxelize_core::math::*;
    /// let shape = GridShape::new(&[2, 2]).unwrap();
    /// let coords = shape.iter_coords().collect::<Vec<_>>();
    /// assert_eq!(vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]], coords);
    /// ```
    pub fn iter_coords(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        self.dims
            .iter()
            .map(|&size| 0..size)
            .multi_cartesian_product()
    }
}

impl Display for GridShape {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.dims.iter().join("x"))
    }
}

impl TryFrom<Vec<usize>> for GridShape {
    type Error = anyhow::Error;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        Self::new(&dims)
    }
}

impl From<GridShape> for Vec<usize> {
    fn from(shape: GridShape) -> Self {
        shape.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_degenerate_shapes() {
        assert!(GridShape::new(&[]).is_err());
        assert!(GridShape::new(&[4, 0]).is_err());
        assert!(GridShape::new(&[usize::MAX, 2]).is_err());
    }

    #[test]
    fn test_strides_are_row_major() {
        let shape = GridShape::new(&[5, 4, 3, 2]).unwrap();
        assert_eq!(&[24, 6, 2, 1], shape.strides());
        assert_eq!(120, shape.volume());
        assert_eq!(120, shape.sentinel());
        assert_eq!(4, shape.ndim());
    }

    #[test]
    fn test_encode_decode_bijection() {
        let shape = GridShape::new(&[3, 4, 5]).unwrap();
        let mut seen = vec![false; shape.volume()];
        let mut decoded = [0; 3];
        for coord in shape.iter_coords() {
            let index = shape.encode(&coord);
            assert!(index < shape.volume());
            assert!(!seen[index], "Index {} produced twice", index);
            seen[index] = true;

            shape.decode(index, &mut decoded);
            assert_eq!(coord.as_slice(), &decoded[..]);
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_iter_coords_follows_linear_order() {
        let shape = GridShape::new(&[2, 3, 2]).unwrap();
        for (expected_index, coord) in shape.iter_coords().enumerate() {
            assert_eq!(expected_index, shape.encode(&coord));
        }
        assert_eq!(shape.volume(), shape.iter_coords().count());
    }

    #[test]
    fn test_single_axis() {
        let shape = GridShape::new(&[7]).unwrap();
        assert_eq!(&[1], shape.strides());
        assert_eq!(6, shape.encode(&[6]));
        assert_eq!(vec![5], shape.decode_to_vec(5));
    }

    #[test]
    fn test_try_encode_reports_bad_coordinates() {
        let shape = GridShape::new(&[2, 3]).unwrap();
        assert_eq!(5, shape.try_encode(&[1, 2]).unwrap());
        assert!(shape.try_encode(&[1, 3]).is_err());
        assert!(shape.try_encode(&[0, 0, 0]).is_err());
        assert!(!shape.contains(&[2, 0]));
        assert!(shape.contains(&[1, 0]));
    }

    #[test]
    fn test_display() {
        let shape = GridShape::new(&[41, 1600, 1408]).unwrap();
        assert_eq!("41x1600x1408", shape.to_string());
    }

    #[test]
    fn test_conversion_from_vec() {
        let shape = GridShape::try_from(vec![2, 2]).unwrap();
        assert_eq!(4, shape.volume());
        assert!(GridShape::try_from(vec![0]).is_err());
        let dims: Vec<usize> = shape.into();
        assert_eq!(vec![2, 2], dims);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip_recomputes_strides() {
        let shape: GridShape = serde_json::from_str("[2, 3, 4]").unwrap();
        assert_eq!(&[12, 4, 1], shape.strides());
        assert_eq!("[2,3,4]", serde_json::to_string(&shape).unwrap());
        assert!(serde_json::from_str::<GridShape>("[2, 0]").is_err());
    }
}
