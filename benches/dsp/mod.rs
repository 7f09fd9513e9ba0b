//! Benchmarks for low-level DSP primitives.

mod amplify;
mod analysis;
mod compressor;
mod grain;

pub use amplify::bench_amplify;
pub use analysis::bench_analysis;
pub use compressor::bench_compressor;
pub use grain::bench_grain;
