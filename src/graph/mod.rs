//! Block-rendering audio graph for transposed playback.
//!
//! Graph nodes wrap the low-level DSP primitives with the parameter plumbing
//! the engine needs. A [`chain::PlayerGraph`] wires them into the fixed
//! player → volume → analyser → compressor path.

/// Pass-through analysis tap.
pub mod analyser;
/// The concrete per-buffer player graph.
pub mod chain;
/// Compressor node with live threshold and ratio.
pub mod compressor;
/// Volume in decibels.
pub mod gain;
/// Core traits shared by all graph nodes.
pub mod node;
/// Granular source node with detune and playback rate.
pub mod player;

pub use chain::PlayerGraph;
pub use node::{GraphNode, RenderCtx};
