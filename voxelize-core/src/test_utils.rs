use rand::{distributions::Uniform, prelude::Distribution, thread_rng, Rng};

use crate::math::GridShape;

/// Generates `count` random points inside `shape`, each as a pair of feature vector and grid coordinate
pub(crate) fn random_points(
    shape: &GridShape,
    num_features: usize,
    count: usize,
) -> Vec<(Vec<f32>, Vec<usize>)> {
    let mut rng = thread_rng();
    let feature_distribution = Uniform::new(-10.0f32, 10.0);
    (0..count)
        .map(|_| {
            let features = (0..num_features)
                .map(|_| feature_distribution.sample(&mut rng))
                .collect();
            let coord = shape
                .dims()
                .iter()
                .map(|&size| rng.gen_range(0..size))
                .collect();
            (features, coord)
        })
        .collect()
}
