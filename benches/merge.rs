use criterion::{
    BatchSize,
    BenchmarkId,
    criterion_group,
    criterion_main,
    Criterion,
    Throughput,
};

use bevy_splat_aggregate::{
    ATTRIBUTE_STRIDE,
    SplatAggregator,
    random_splat_buffer,
};


const SPLAT_COUNTS: [usize; 3] = [
    1000,
    84_348,
    1_244_819,
];

fn aggregate_merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge splat assets");
    for count in SPLAT_COUNTS.iter() {
        group.throughput(Throughput::Bytes(*count as u64 * 2 * ATTRIBUTE_STRIDE as u64));
        group.bench_with_input(
            BenchmarkId::new("merge", count),
            &count,
            |b, &count| {
                let first = random_splat_buffer(*count, Some(3));
                let second = random_splat_buffer(*count, Some(3));

                b.iter_batched(
                    || (first.clone(), second.clone()),
                    |(first, second)| {
                        let mut aggregator = SplatAggregator::default();
                        let _ = aggregator.add_asset(first);
                        let _ = aggregator.add_asset(second);
                        aggregator
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
}

fn node_transform_benchmark(c: &mut Criterion) {
    let mut aggregator = SplatAggregator::default();
    let handles = (0..64)
        .filter_map(|_| aggregator.add_asset(random_splat_buffer(100, None)).ok())
        .collect::<Vec<_>>();

    c.bench_function("set node transforms", |b| {
        b.iter(|| {
            for (i, handle) in handles.iter().enumerate() {
                let transform = bevy::math::Mat4::from_translation(bevy::math::Vec3::splat(i as f32));
                let _ = aggregator.set_node_transform(*handle, transform);
            }
        });
    });
}

criterion_group!{
    name = merge_benches;
    config = Criterion::default().sample_size(10);
    targets = aggregate_merge_benchmark, node_transform_benchmark
}
criterion_main!(merge_benches);
