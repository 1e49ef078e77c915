use std::iter::FromIterator;

use nalgebra::{Point3, Vector3};

/// 3D axis-aligned bounding box of point positions
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AABB {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl AABB {
    /// Creates a new AABB from the given minimum and maximum coordinates. Panics if the minimum position is
    /// not less than or equal to the maximum position on every axis
    /// ```
    /// # use voxelize_core::math::AABB;
    /// # use voxelize_core::nalgebra::Point3;
    /// let bounds = AABB::from_min_max(Point3::new(0.0, -40.0, -3.0), Point3::new(70.4, 40.0, 1.0));
    /// ```
    pub fn from_min_max(min: Point3<f64>, max: Point3<f64>) -> Self {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            panic!("AABB::from_min_max: Minimum position must be <= maximum position!");
        }
        Self { min, max }
    }

    /// Like [from_min_max](AABB::from_min_max) but without the check that `min <= max`
    pub fn from_min_max_unchecked(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Returns the minimum point of this AABB
    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    /// Returns the maximum point of this AABB
    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    /// Returns the size of this AABB along each axis
    /// ```
    /// # use voxelize_core::math::AABB;
    /// # use voxelize_core::nalgebra::{Point3, Vector3};
    /// let bounds = AABB::from_min_max(Point3::new(0.0, -40.0, -3.0), Point3::new(70.4, 40.0, 1.0));
    /// assert_eq!(Vector3::new(70.4, 80.0, 4.0), bounds.extent());
    /// ```
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Returns true if `point` lies within this AABB. Points on the boundary count as contained
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns the smallest AABB that contains both `bounds` and `point`
    /// ```
    /// # use voxelize_core::math::AABB;
    /// # use voxelize_core::nalgebra::Point3;
    /// let bounds = AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// let extended = AABB::extend_with_point(&bounds, &Point3::new(2.0, -1.0, 0.5));
    /// assert_eq!(Point3::new(0.0, -1.0, 0.0), *extended.min());
    /// assert_eq!(Point3::new(2.0, 1.0, 1.0), *extended.max());
    /// ```
    pub fn extend_with_point(bounds: &AABB, point: &Point3<f64>) -> AABB {
        Self {
            min: bounds.min.inf(point),
            max: bounds.max.sup(point),
        }
    }
}

/// Collects the bounding box of a sequence of positions. Panics if the sequence is empty
impl FromIterator<Point3<f64>> for AABB {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        let mut iter = iter.into_iter();
        let first = iter
            .next()
            .expect("Can't compute the bounds of an empty sequence of positions");
        iter.fold(
            Self::from_min_max_unchecked(first, first),
            |bounds, position| Self::extend_with_point(&bounds, &position),
        )
    }
}
