use std::collections::HashMap;

use rand::{distributions::Uniform, prelude::Distribution, Rng};
use voxelize_core::math::GridShape;

/// A batch of points in the flat layout that the voxelizer consumes
pub struct TestBatch {
    pub num_features: usize,
    pub features: Vec<f32>,
    pub coords: Vec<usize>,
}

impl TestBatch {
    pub fn point_features(&self, point: usize) -> &[f32] {
        &self.features[point * self.num_features..(point + 1) * self.num_features]
    }
}

/// Creates `count` random points inside `shape`. Features are small integers, so that their sums are exact in `f32`
pub fn random_batch<R: Rng>(
    rng: &mut R,
    shape: &GridShape,
    num_features: usize,
    count: usize,
) -> TestBatch {
    let feature_distribution = Uniform::new(-64i32, 64);
    let mut features = Vec::with_capacity(count * num_features);
    let mut coords = Vec::with_capacity(count * shape.ndim());
    for _ in 0..count {
        features.extend((0..num_features).map(|_| feature_distribution.sample(rng) as f32));
        coords.extend(shape.dims().iter().map(|&size| rng.gen_range(0..size)));
    }
    TestBatch {
        num_features,
        features,
        coords,
    }
}

/// Computes the mean feature vector of every occupied cell sequentially, keyed by linear cell index
pub fn reference_means(shape: &GridShape, batch: &TestBatch) -> HashMap<usize, Vec<f32>> {
    let num_features = batch.num_features;
    let mut sums: HashMap<usize, (Vec<f64>, usize)> = HashMap::new();
    for (point, coord) in batch.coords.chunks_exact(shape.ndim()).enumerate() {
        let entry = sums
            .entry(shape.encode(coord))
            .or_insert_with(|| (vec![0.0; num_features], 0));
        for (sum, &value) in entry.0.iter_mut().zip(batch.point_features(point)) {
            *sum += value as f64;
        }
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(index, (sum, count))| {
            let mean = sum.iter().map(|&s| (s / count as f64) as f32).collect();
            (index, mean)
        })
        .collect()
}
