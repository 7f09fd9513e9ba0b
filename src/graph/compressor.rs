use crate::{
    dsp::compressor::Compressor,
    graph::node::{GraphNode, RenderCtx},
};

pub struct CompressorNode {
    compressor: Compressor,
    sample_rate: f32,
}

impl CompressorNode {
    pub fn new(threshold_db: f32, ratio: f32, attack: f32, release: f32, sample_rate: f32) -> Self {
        Self {
            compressor: Compressor::new(threshold_db, ratio, attack, release, sample_rate),
            sample_rate,
        }
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.compressor.set_threshold_db(threshold_db);
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.compressor.set_ratio(ratio);
    }
}

impl GraphNode for CompressorNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if ctx.sample_rate != self.sample_rate {
            self.sample_rate = ctx.sample_rate;
            self.compressor.set_sample_rate(ctx.sample_rate);
        }
        self.compressor.process(out);
    }

    fn reset(&mut self) {
        self.compressor.reset();
    }
}
