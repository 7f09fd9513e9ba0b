use crate::{
    dsp::analysis::{AnalysisSnapshot, Analyser},
    graph::node::{GraphNode, RenderCtx},
};

/// Pass-through tap feeding an [`Analyser`]. Audio leaves unchanged.
pub struct AnalyserNode {
    analyser: Analyser,
}

impl AnalyserNode {
    pub fn new(size: usize) -> Self {
        Self {
            analyser: Analyser::new(size),
        }
    }

    pub fn size(&self) -> usize {
        self.analyser.size()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.analyser.snapshot()
    }
}

impl GraphNode for AnalyserNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.analyser.push(out);
    }

    fn reset(&mut self) {
        self.analyser.clear();
    }
}
