use std::sync::Arc;

use crate::{
    dsp::grain::{cents_to_ratio, GrainShifter},
    graph::node::{GraphNode, RenderCtx},
};

/*
Grain Player
============

The source node of every player graph. It owns a shared handle to the decoded
samples and plays them through a `GrainShifter`, exposing the two controls the
engine drives:

  detune (cents)     Pitch offset. 100 cents = 1 semitone, so a transposition
                     of +3 with fine tune -20 is 280 cents.

  playback rate      Tempo multiplier. 1.0 is the recorded speed.

Changing one never touches the other. The detune is converted to a ratio
once per change, not per sample.

Decoded buffers keep their own sample rate. The player folds the
source/output ratio into both steps, so a 44.1 kHz file on a 48 kHz device
keeps its pitch and length.

    rate_step  = playback_rate × source_rate / output_rate
    pitch_step = 2^(detune / 1200) × source_rate / output_rate

Example usage:
  let mut player = GrainPlayerNode::new(samples, 44_100.0, 0.18, 0.1, 48_000.0);
  player.set_detune(300.0);
  player.start(12.5);
*/

pub struct GrainPlayerNode {
    samples: Arc<[f32]>,
    source_rate: f32,
    output_rate: f32,
    shifter: GrainShifter,
    detune_cents: f32,
    pitch_ratio: f64,
    playback_rate: f32,
    playing: bool,
}

impl GrainPlayerNode {
    pub fn new(
        samples: Arc<[f32]>,
        source_rate: f32,
        grain_size: f32,
        overlap: f32,
        output_rate: f32,
    ) -> Self {
        Self {
            samples,
            source_rate,
            output_rate,
            shifter: GrainShifter::new(grain_size, overlap, output_rate),
            detune_cents: 0.0,
            pitch_ratio: 1.0,
            playback_rate: 1.0,
            playing: false,
        }
    }

    /// Begin playing at `offset` seconds into the source.
    pub fn start(&mut self, offset: f64) {
        self.shifter.start(offset.max(0.0) * self.source_rate as f64);
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.shifter.stop();
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn detune(&self) -> f32 {
        self.detune_cents
    }

    pub fn set_detune(&mut self, cents: f32) {
        self.detune_cents = cents;
        self.pitch_ratio = cents_to_ratio(cents);
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        self.playback_rate = rate;
    }

    /// Read head position in source seconds.
    pub fn position(&self) -> f64 {
        self.shifter.read_head() / self.source_rate as f64
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.source_rate as f64
    }

    /// True once the source has been played out.
    pub fn is_finished(&self) -> bool {
        self.shifter.is_finished(self.samples.len())
    }
}

impl GraphNode for GrainPlayerNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.playing {
            out.fill(0.0);
            return;
        }
        if ctx.sample_rate != self.output_rate {
            self.output_rate = ctx.sample_rate;
        }

        let conversion = self.source_rate as f64 / self.output_rate as f64;
        let rate_step = self.playback_rate as f64 * conversion;
        let pitch_step = self.pitch_ratio * conversion;
        self.shifter
            .render(&self.samples, out, rate_step, pitch_step);

        if self.is_finished() {
            self.playing = false;
        }
    }

    fn reset(&mut self) {
        self.stop();
    }

    fn is_active(&self) -> bool {
        self.playing
    }
}
