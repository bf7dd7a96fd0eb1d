use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use match_core::{DescriptorArray, Feature, ImageCollection, ImageDescriptorSet, MatcherConfig};
use match_engine::SparseMatcher;
use match_index::KdTree;

const DIMENSION: usize = 32;

/// Collection where consecutive images share most descriptors, like frames of a video
fn create_sequence(n_images: usize, n_features: usize) -> ImageCollection<u8> {
    let mut state = 0x9e37_79b9u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };

    let base: Vec<u8> = (0..n_features * DIMENSION).map(|_| (next() % 256) as u8).collect();
    let images = (0..n_images)
        .map(|i| {
            let data: Vec<u8> = base
                .iter()
                .map(|&b| b.saturating_add((next() % 8) as u8))
                .collect();
            let features = (0..n_features)
                .map(|k| Feature::new((k % 640) as f32 + i as f32, (k / 640) as f32))
                .collect();
            ImageDescriptorSet::new(
                format!("frame{:04}", i),
                features,
                DescriptorArray::new(data, DIMENSION).unwrap(),
            )
            .unwrap()
        })
        .collect();
    ImageCollection::new(images).unwrap()
}

fn create_test_config(radius: usize) -> MatcherConfig {
    MatcherConfig::new(0.8, radius)
}

/// Benchmark exhaustive vs windowed scheduling
fn bench_pair_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_radius");
    group.sample_size(10);
    let collection = create_sequence(12, 500);

    for radius in [0, 2, 5] {
        let matcher = SparseMatcher::new(create_test_config(radius)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(radius), &collection, |b, collection| {
            b.iter(|| black_box(matcher.match_collection(black_box(collection)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark brute force against the kd-tree backend
fn bench_index_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_backend");
    group.sample_size(10);
    let collection = create_sequence(6, 1000);

    let brute = SparseMatcher::new(create_test_config(0)).unwrap();
    group.bench_function("brute-force", |b| {
        b.iter(|| black_box(brute.match_collection(black_box(&collection)).unwrap()))
    });

    let tree = SparseMatcher::with_index(create_test_config(0), KdTree::<DIMENSION>).unwrap();
    group.bench_function("kd-tree", |b| {
        b.iter(|| black_box(tree.match_collection(black_box(&collection)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_pair_radius, bench_index_backends);
criterion_main!(benches);
