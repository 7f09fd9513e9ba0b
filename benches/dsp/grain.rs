//! Benchmarks for the granular pitch shifter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_transpose::dsp::grain::{cents_to_ratio, GrainShifter};

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_grain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/grain");
    let source = test_signal();
    // 44.1k source played at 48k
    let rate_ratio = 44_100.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size];

        let mut unity = GrainShifter::new(0.18, 0.1, 48_000.0);
        unity.start(0.0);
        group.bench_with_input(BenchmarkId::new("unity", size), &size, |b, _| {
            b.iter(|| {
                if unity.is_finished(source.len()) {
                    unity.start(0.0);
                }
                unity.render(black_box(&source), black_box(&mut out), rate_ratio, rate_ratio)
            })
        });

        // +7 semitones, 80% tempo: grains read faster than the head moves
        let mut shifted = GrainShifter::new(0.18, 0.1, 48_000.0);
        shifted.start(0.0);
        let pitch_step = rate_ratio * cents_to_ratio(700.0);
        group.bench_with_input(BenchmarkId::new("fifth_up_slow", size), &size, |b, _| {
            b.iter(|| {
                if shifted.is_finished(source.len()) {
                    shifted.start(0.0);
                }
                shifted.render(black_box(&source), black_box(&mut out), rate_ratio * 0.8, pitch_step)
            })
        });
    }

    group.finish();
}
