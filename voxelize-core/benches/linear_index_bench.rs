use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{thread_rng, Rng};
use voxelize_core::math::GridShape;

fn gen_random_coords(shape: &GridShape, count: usize) -> Vec<usize> {
    let mut rng = thread_rng();
    (0..count)
        .flat_map(|_| {
            shape
                .dims()
                .iter()
                .map(|&size| rng.gen_range(0..size))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn encode_all(shape: &GridShape, coords: &[usize]) {
    for coord in coords.chunks_exact(shape.ndim()) {
        black_box(shape.encode(coord));
    }
}

fn decode_all(shape: &GridShape, indices: &[usize]) {
    let mut coord = vec![0; shape.ndim()];
    for &index in indices {
        shape.decode(index, &mut coord);
        black_box(&coord);
    }
}

fn bench(c: &mut Criterion) {
    let shape = GridShape::new(&[41, 1600, 1408]).unwrap();
    let coords = gen_random_coords(&shape, 4096);
    let indices = coords
        .chunks_exact(shape.ndim())
        .map(|coord| shape.encode(coord))
        .collect::<Vec<_>>();

    c.bench_function("linear_index_encode", |b| {
        b.iter(|| encode_all(&shape, &coords));
    });
    c.bench_function("linear_index_decode", |b| {
        b.iter(|| decode_all(&shape, &indices));
    });
}

criterion_group! {
    name = linear_index;
    config = Criterion::default().sample_size(40);
    targets = bench
}
criterion_main!(linear_index);
