//! Benchmarks for drift detection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sensorflow::drift::{ks_2samp, DriftDetector};
use sensorflow::testing::sensor_dataset;

fn samples(n: usize, offset: f64) -> Vec<f64> {
    (0..n).map(|i| ((i * 7919) % 1000) as f64 + offset).collect()
}

fn ks_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ks_2samp");
    for n in [1_000usize, 5_000, 20_000] {
        let base = samples(n, 0.0);
        let current = samples(n, 3.5);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| ks_2samp(black_box(&base), black_box(&current)));
        });
    }
    group.finish();
}

fn detector_benchmark(c: &mut Criterion) {
    let base = sensor_dataset(1_000, 0.0);
    let current = sensor_dataset(1_000, 25.0);
    let detector = DriftDetector::default();
    c.bench_function("detect_1k_rows", |b| {
        b.iter(|| detector.detect(black_box(&base), black_box(&current)));
    });
}

criterion_group!(benches, ks_benchmark, detector_benchmark);
criterion_main!(benches);
