use crate::{
    dsp::amplify::{apply_gain, db_to_gain},
    graph::node::{GraphNode, RenderCtx},
};

/// Output volume stage, set in decibels.
pub struct GainNode {
    gain_db: f32,
    gain: f32,
}

impl GainNode {
    pub fn new(gain_db: f32) -> Self {
        Self {
            gain_db,
            gain: db_to_gain(gain_db),
        }
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        self.gain = db_to_gain(gain_db);
    }
}

impl GraphNode for GainNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        apply_gain(out, self.gain);
    }
}
