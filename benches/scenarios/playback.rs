//! Benchmarks for the player graph and engine render loop.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_transpose::{
    config::EngineConfig,
    engine::{ManualClock, PlaybackEngine},
    graph::{GraphNode, PlayerGraph, RenderCtx},
    io::{AudioSource, DecodedBuffer},
};

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/playback");
    let buffer = DecodedBuffer::from_samples(test_signal(), 44_100, 1);
    let config = EngineConfig::default();
    let ctx = RenderCtx::new(48_000.0);

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size];

        // === GRAPH ONLY ===
        // player → gain → analyser → compressor, transposed down a fourth
        let mut graph = PlayerGraph::new(&buffer, &config, 48_000.0);
        graph.player.set_detune(-500.0);
        graph.player.start(0.0);
        group.bench_with_input(BenchmarkId::new("graph", size), &size, |b, _| {
            b.iter(|| {
                if graph.player.is_finished() {
                    graph.player.start(0.0);
                }
                graph.render_block(black_box(&mut out), black_box(&ctx));
            })
        });

        // === ENGINE WITH LIVE EDITS ===
        // pitch and tempo change every block, as when a user holds a key
        let mut engine = PlaybackEngine::new(ManualClock::new(), config, 48_000.0);
        engine.load_buffer(AudioSource::new("bench.wav"), buffer.clone(), 0);
        let _ = engine.play();
        let mut step = 0i32;
        group.bench_with_input(BenchmarkId::new("engine_live_edits", size), &size, |b, _| {
            b.iter(|| {
                step = (step + 1) % 24;
                let _ = engine.set_pitch(step - 12);
                let _ = engine.set_tempo(0.8 + step as f32 * 0.01);
                engine.render_block(black_box(&mut out));
            })
        });
    }

    group.finish();
}
