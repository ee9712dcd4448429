use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use stepps_tracker::models::{LocationFix, SampleVector};
use stepps_tracker::services::{DistanceAccumulator, StepDetector};

/// Ten seconds of 50 Hz walking: a jolt roughly every 500 ms over gravity.
fn walking_stream() -> Vec<SampleVector> {
    (0..500u64)
        .map(|i| {
            let phase = (i % 25) as f32 / 25.0 * std::f32::consts::TAU;
            SampleVector::new(
                0.3 * phase.cos(),
                0.2 * phase.sin(),
                9.81 + 6.0 * phase.sin(),
                i * 20,
            )
        })
        .collect()
}

fn benchmark_step_detection(c: &mut Criterion) {
    let samples = walking_stream();

    let mut group = c.benchmark_group("step_detection");

    group.bench_function("walking_500_samples", |b| {
        b.iter(|| {
            let mut detector = StepDetector::default();
            black_box(&samples)
                .iter()
                .filter_map(|s| detector.on_sample(s))
                .count()
        })
    });

    group.finish();
}

fn benchmark_distance(c: &mut Criterion) {
    let fixes: Vec<LocationFix> = (0..600u64)
        .map(|i| LocationFix {
            latitude: 37.4 + i as f64 * 0.00005,
            longitude: -122.1,
            accuracy_m: if i % 10 == 0 { 35.0 } else { 6.0 },
            timestamp_ms: i * 1000,
        })
        .collect();

    c.bench_function("distance_600_fixes", |b| {
        b.iter(|| {
            let mut acc = DistanceAccumulator::new(20.0, 1.0);
            for fix in black_box(&fixes) {
                acc.on_location_fix(fix);
            }
            acc.total_m()
        })
    });
}

criterion_group!(benches, benchmark_step_detection, benchmark_distance);
criterion_main!(benches);
