use std::collections::HashSet;

use rayon::prelude::*;

/// Turns the per-point cell indices of a batch into the list of unique occupied cells.
///
/// Implementations receive the point index slots of a batch, which may contain the `sentinel` for unassigned
/// points, and return every other value exactly once. The order of the result is up to the implementation, but it
/// determines the order of the gathered voxels. The choice between a sort-based and a hash-based implementation is
/// purely a performance decision. Any `Fn(&[usize], usize) -> Vec<usize>` implements this trait as well.
pub trait UniqueIndices {
    /// Returns the distinct values in `point_indices`, excluding `sentinel`
    fn unique_indices(&self, point_indices: &[usize], sentinel: usize) -> Vec<usize>;
}

impl<F> UniqueIndices for F
where
    F: Fn(&[usize], usize) -> Vec<usize>,
{
    fn unique_indices(&self, point_indices: &[usize], sentinel: usize) -> Vec<usize> {
        self(point_indices, sentinel)
    }
}

/// Sort-based [UniqueIndices]: sorts the indices in parallel and removes duplicates. Produces the occupied cells in
/// ascending linear index order, which is also the order in which they are laid out in the grid
///
/// ```
/// # use voxelize_algorithms::unique::*;
/// assert_eq!(vec![0, 3], SortedUnique.unique_indices(&[3, 0, 0, 4, 4], 4));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SortedUnique;

impl UniqueIndices for SortedUnique {
    fn unique_indices(&self, point_indices: &[usize], sentinel: usize) -> Vec<usize> {
        let mut unique = point_indices
            .par_iter()
            .copied()
            .filter(|&index| index != sentinel)
            .collect::<Vec<_>>();
        unique.par_sort_unstable();
        unique.dedup();
        unique
    }
}

/// Hash-based [UniqueIndices]: keeps the occupied cells in the order in which their first point appears in the batch
///
/// ```
/// # use voxelize_algorithms::unique::*;
/// assert_eq!(vec![3, 0], FirstSeenUnique.unique_indices(&[3, 0, 3, 4, 4], 4));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstSeenUnique;

impl UniqueIndices for FirstSeenUnique {
    fn unique_indices(&self, point_indices: &[usize], sentinel: usize) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(point_indices.len());
        point_indices
            .iter()
            .copied()
            .filter(|&index| index != sentinel && seen.insert(index))
            .collect()
    }
}
