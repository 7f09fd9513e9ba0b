use crate::{
    config::EngineConfig,
    dsp::AnalysisSnapshot,
    graph::{
        analyser::AnalyserNode,
        compressor::CompressorNode,
        gain::GainNode,
        node::{GraphNode, RenderCtx},
        player::GrainPlayerNode,
    },
    io::DecodedBuffer,
};

/*
Player Graph
============

One graph is built per loaded buffer and dropped with it:

    GrainPlayerNode ──► GainNode ──► AnalyserNode ──► CompressorNode ──► out
    (pitch, tempo)      (volume)     (tap, no-op)     (level control)

All stages after the player process the block in place, so a render is a
single pass over one buffer with no scratch allocation.
*/

pub struct PlayerGraph {
    pub player: GrainPlayerNode,
    pub gain: GainNode,
    pub analyser: AnalyserNode,
    pub compressor: CompressorNode,
}

impl PlayerGraph {
    pub fn new(buffer: &DecodedBuffer, config: &EngineConfig, sample_rate: f32) -> Self {
        let comp = &config.compressor;
        Self {
            player: GrainPlayerNode::new(
                buffer.samples(),
                buffer.sample_rate() as f32,
                config.grain.grain_size,
                config.grain.overlap,
                sample_rate,
            ),
            gain: GainNode::new(config.initial_gain_db),
            analyser: AnalyserNode::new(config.analyser_size),
            compressor: CompressorNode::new(
                comp.threshold_db,
                comp.ratio,
                comp.attack,
                comp.release,
                sample_rate,
            ),
        }
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.analyser.snapshot()
    }
}

impl GraphNode for PlayerGraph {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.player.render_block(out, ctx);
        self.gain.render_block(out, ctx);
        self.analyser.render_block(out, ctx);
        self.compressor.render_block(out, ctx);
    }

    fn reset(&mut self) {
        self.player.reset();
        self.analyser.reset();
        self.compressor.reset();
    }

    fn is_active(&self) -> bool {
        self.player.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> PlayerGraph {
        let buffer = DecodedBuffer::from_samples(vec![0.25; 48_000], 48_000, 1);
        PlayerGraph::new(&buffer, &EngineConfig::default(), 48_000.0)
    }

    #[test]
    fn idle_graph_is_silent() {
        let mut graph = graph();
        let mut out = [1.0; 256];
        graph.render_block(&mut out, &RenderCtx::new(48_000.0));
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn analyser_sees_the_volume_stage() {
        let mut graph = graph();
        graph.player.start(0.0);
        let mut out = [0.0; 512];
        graph.render_block(&mut out, &RenderCtx::new(48_000.0));

        // 0.25 at -6 dB, below the compressor threshold
        let snapshot = graph.snapshot();
        let last = *snapshot.waveform.last().unwrap_or(&0.0);
        assert!((last - 0.125).abs() < 0.01, "got {last}");
    }
}
