//! Real-world scenario benchmarks.
//!
//! These follow the player's hot path: the full graph rendering a decoded
//! song, with pitch and tempo moving while it plays.

mod playback;

pub use playback::bench_playback;
