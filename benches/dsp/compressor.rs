//! Benchmarks for the feed-forward compressor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_transpose::dsp::compressor::Compressor;

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/compressor");
    let source = test_signal();

    for &size in BLOCK_SIZES {
        let mut compressor = Compressor::default();
        compressor.set_sample_rate(48_000.0);
        let mut buffer = vec![0.0f32; size];
        let mut offset = 0;

        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, _| {
            b.iter(|| {
                if offset + size > source.len() {
                    offset = 0;
                }
                buffer.copy_from_slice(&source[offset..offset + size]);
                offset += size;
                compressor.process(black_box(&mut buffer))
            })
        });
    }

    group.finish();
}
