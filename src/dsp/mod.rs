//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components are allocation-free on the render path and realtime-safe.
//! They stay focused on the signal-processing math; the graph layer adds
//! parameter plumbing and block orchestration on top.

/// Decibel conversions and constant gain.
pub mod amplify;
/// Waveform ring and FFT spectrum for visualisers.
pub mod analysis;
/// Feed-forward peak compressor.
pub mod compressor;
/// Granular pitch shifting and time stretching.
pub mod grain;

pub use analysis::AnalysisSnapshot;
