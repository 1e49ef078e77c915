/// Borrowed view of a single voxel in a [VoxelBuffer]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voxel<'a> {
    /// The mean feature vector of all points in the voxel
    pub features: &'a [f32],
    /// The grid coordinate of the voxel
    pub coord: &'a [usize],
}

/// Compact list of occupied voxels: one mean feature vector and one grid coordinate per voxel.
///
/// Features and coordinates are stored in two flat row-major arrays (`len() × num_features()` and
/// `len() × ndim()`), so that they can be handed to consumers that expect dense tensors. The voxel at position `i`
/// corresponds to the `i`-th entry of the unique cell index list it was gathered from.
///
/// ```
/// # use voxelize_core::containers::VoxelBuffer;
/// let mut voxels = VoxelBuffer::with_len(2, 1, 2);
/// voxels.features_mut().copy_from_slice(&[2.0, 5.0]);
/// voxels.coords_mut().copy_from_slice(&[0, 0, 1, 1]);
/// assert_eq!(&[5.0], voxels.voxel(1).features);
/// assert_eq!(&[1, 1], voxels.voxel(1).coord);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoxelBuffer {
    num_features: usize,
    ndim: usize,
    features: Vec<f32>,
    coords: Vec<usize>,
}

impl VoxelBuffer {
    /// Creates an empty `VoxelBuffer` for voxels with `num_features` features in a grid with `ndim` axes
    pub fn new(num_features: usize, ndim: usize) -> Self {
        Self {
            num_features,
            ndim,
            features: vec![],
            coords: vec![],
        }
    }

    /// Creates a `VoxelBuffer` holding `num_voxels` zero-initialized voxels
    pub fn with_len(num_voxels: usize, num_features: usize, ndim: usize) -> Self {
        Self {
            num_features,
            ndim,
            features: vec![0.0; num_voxels * num_features],
            coords: vec![0; num_voxels * ndim],
        }
    }

    /// Resizes this buffer to hold exactly `num_voxels` voxels. New voxels are zero-initialized
    pub fn resize(&mut self, num_voxels: usize) {
        self.features.resize(num_voxels * self.num_features, 0.0);
        self.coords.resize(num_voxels * self.ndim, 0);
    }

    /// Number of voxels in this buffer
    pub fn len(&self) -> usize {
        if self.ndim == 0 {
            0
        } else {
            self.coords.len() / self.ndim
        }
    }

    /// Returns true if this buffer holds no voxels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the feature vector of each voxel
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of components of each voxel coordinate
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// The features of all voxels, `num_features()` values per voxel
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// The coordinates of all voxels, `ndim()` values per voxel
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// Mutable access to the features of all voxels
    pub fn features_mut(&mut self) -> &mut [f32] {
        &mut self.features
    }

    /// Mutable access to the coordinates of all voxels
    pub fn coords_mut(&mut self) -> &mut [usize] {
        &mut self.coords
    }

    /// Mutable access to features and coordinates at the same time
    pub fn as_mut_parts(&mut self) -> (&mut [f32], &mut [usize]) {
        (&mut self.features, &mut self.coords)
    }

    /// Returns the voxel at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn voxel(&self, index: usize) -> Voxel<'_> {
        Voxel {
            features: &self.features[index * self.num_features..(index + 1) * self.num_features],
            coord: &self.coords[index * self.ndim..(index + 1) * self.ndim],
        }
    }

    /// Iterator over all voxels in this buffer
    pub fn iter(&self) -> impl Iterator<Item = Voxel<'_>> + '_ {
        (0..self.len()).map(move |index| self.voxel(index))
    }

    /// Consumes this buffer and returns the flat feature and coordinate arrays
    pub fn into_parts(self) -> (Vec<f32>, Vec<usize>) {
        (self.features, self.coords)
    }
}
