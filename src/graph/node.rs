/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Output sample rate (e.g., 48000.0)
/// - time: Output time of the first sample in the block, in seconds
#[derive(Clone, Copy, Debug)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            time: 0.0,
        }
    }

    /// Context for the block that follows one of `frames` samples.
    pub fn advanced(&self, frames: usize) -> Self {
        Self {
            sample_rate: self.sample_rate,
            time: self.time + frames as f64 / self.sample_rate as f64,
        }
    }
}

/// Core trait for audio processing graph nodes
///
/// Sources overwrite `out`; effects and taps process it in place.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Drop any internal state (envelopes, rings, sounding grains).
    ///
    /// Default implementation does nothing (stateless nodes).
    fn reset(&mut self) {
        // Default: do nothing
    }

    /// Check if this node is still producing sound
    ///
    /// Used by the engine to detect the end of the media.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
