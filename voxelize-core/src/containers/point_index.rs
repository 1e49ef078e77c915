use crate::math::GridShape;

/// Per-point record of the grid cell each point was scattered into.
///
/// The buffer has one slot per point it can hold plus one trailing guard slot. A slot either contains the linear
/// index of a cell, or the sentinel of the grid (its volume), which marks the slot as unassigned. The sentinel is
/// out of range for every cell index, so no extra storage is needed to tell the two apart. The guard slot is never
/// written by a scatter and therefore always holds the sentinel after a reset.
///
/// ```
/// # use voxelize_core::containers::PointIndexBuffer;
/// # use voxelize_core::math::GridShape;
/// let shape = GridShape::new(&[2, 2]).unwrap();
/// let buffer = PointIndexBuffer::new(3, &shape);
/// assert_eq!(3, buffer.max_points());
/// assert_eq!(&[4, 4, 4, 4], buffer.as_slice());
/// assert_eq!(0, buffer.assigned().count());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointIndexBuffer {
    indices: Vec<usize>,
    sentinel: usize,
}

impl PointIndexBuffer {
    /// Creates a buffer for up to `max_points` points, with every slot set to the sentinel of `shape`
    ///
    /// # Panics
    ///
    /// If `max_points` is `usize::MAX`, since the guard slot would not fit
    pub fn new(max_points: usize, shape: &GridShape) -> Self {
        Self {
            indices: vec![shape.sentinel(); max_points + 1],
            sentinel: shape.sentinel(),
        }
    }

    /// Maximum number of points whose cell indices fit into this buffer
    pub fn max_points(&self) -> usize {
        self.indices.len() - 1
    }

    /// The value that marks an unassigned slot
    pub fn sentinel(&self) -> usize {
        self.sentinel
    }

    /// Sets the sentinel used by [is_assigned](PointIndexBuffer::is_assigned). This does not touch the slots, so
    /// it has to be followed by a reset of all slots
    pub fn set_sentinel(&mut self, sentinel: usize) {
        self.sentinel = sentinel;
    }

    /// All slots of this buffer, including the guard slot
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Mutable access to all slots of this buffer, including the guard slot
    pub fn as_mut_slice(&mut self) -> &mut [usize] {
        &mut self.indices
    }

    /// The cell index recorded for `point`, or `None` if the slot holds the sentinel
    pub fn get(&self, point: usize) -> Option<usize> {
        let index = self.indices[point];
        if index == self.sentinel {
            None
        } else {
            Some(index)
        }
    }

    /// Returns true if the slot for `point` holds a cell index
    pub fn is_assigned(&self, point: usize) -> bool {
        self.get(point).is_some()
    }

    /// Iterator over `(point, cell index)` pairs of all assigned slots
    pub fn assigned(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let sentinel = self.sentinel;
        self.indices
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(_, index)| index != sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_slots() {
        let shape = GridShape::new(&[3, 3]).unwrap();
        let mut buffer = PointIndexBuffer::new(4, &shape);
        buffer.as_mut_slice()[1] = 7;
        buffer.as_mut_slice()[3] = 0;

        assert!(!buffer.is_assigned(0));
        assert_eq!(Some(7), buffer.get(1));
        assert_eq!(Some(0), buffer.get(3));
        assert_eq!(None, buffer.get(4));
        assert_eq!(vec![(1, 7), (3, 0)], buffer.assigned().collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_buffer_keeps_guard_slot() {
        let shape = GridShape::new(&[5]).unwrap();
        let buffer = PointIndexBuffer::new(0, &shape);
        assert_eq!(0, buffer.max_points());
        assert_eq!(&[5], buffer.as_slice());
    }
}
