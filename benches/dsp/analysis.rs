//! Benchmarks for the output analyser.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_transpose::dsp::analysis::Analyser;

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/analysis");
    let source = test_signal();

    for &size in BLOCK_SIZES {
        let mut analyser = Analyser::default();
        let block = &source[..size];

        group.bench_with_input(BenchmarkId::new("push", size), &size, |b, _| {
            b.iter(|| analyser.push(black_box(block)))
        });
    }

    // Spectrum cost depends on the FFT size, not the block size
    for fft_size in [256, 1024, 4096] {
        let mut analyser = Analyser::new(fft_size);
        analyser.push(&source[..fft_size]);
        group.bench_with_input(BenchmarkId::new("spectrum_db", fft_size), &fft_size, |b, _| {
            b.iter(|| black_box(analyser.spectrum_db()))
        });
    }

    group.finish();
}
