//! Benchmarks for derived data cache writes and mappings.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use vellum_ddc::{DerivedDataCache, DerivedDataKey, MapOptions};

fn bench_create(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let cache = DerivedDataCache::new(dir.path()).unwrap();
    let mut group = c.benchmark_group("ddc_create");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let bytes = vec![0xa5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("write_all", size), &size, |b, &size| {
            let key = DerivedDataKey::derive("bench.write_all", size.to_le_bytes());
            b.iter(|| cache.create_derived_data(key, black_box(&bytes)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("sized", size), &size, |b, &size| {
            let key = DerivedDataKey::derive("bench.sized", size.to_le_bytes());
            b.iter(|| {
                let mut handle = cache.create_derived_data_sized(key, size).unwrap();
                handle.mutable_span().copy_from_slice(black_box(&bytes));
                handle
            });
        });
    }

    group.finish();
}

fn bench_map(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let cache = DerivedDataCache::new(dir.path()).unwrap();
    let mut group = c.benchmark_group("ddc_map");

    for size in [1024usize, 1024 * 1024] {
        let key = DerivedDataKey::derive("bench.map", size.to_le_bytes());
        cache.create_derived_data(key, &vec![1u8; size]).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("whole", size), &size, |b, _| {
            b.iter(|| {
                let handle = cache
                    .get_resource_handle(black_box(key), MapOptions::default())
                    .unwrap()
                    .unwrap();
                handle.immutable_span().iter().map(|&byte| byte as u64).sum::<u64>()
            });
        });
    }

    group.finish();
}

fn bench_does_key_exist(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let cache = DerivedDataCache::new(dir.path()).unwrap();
    let present = DerivedDataKey::from_content(b"present");
    cache.create_derived_data(present, b"x").unwrap();
    let missing = DerivedDataKey::from_content(b"missing");

    c.bench_function("ddc_exists_hit", |b| {
        b.iter(|| cache.does_key_exist(black_box(present)))
    });
    c.bench_function("ddc_exists_miss", |b| {
        b.iter(|| cache.does_key_exist(black_box(missing)))
    });
}

criterion_group!(benches, bench_create, bench_map, bench_does_key_exist);
criterion_main!(benches);
