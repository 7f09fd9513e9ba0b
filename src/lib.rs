pub mod config; // Engine and sync defaults, TOML loading
pub mod deck; // Song → sync → engine wiring
pub mod dsp;
pub mod engine; // Transport, loading, progress
pub mod error;
pub mod graph; // Player node graph
pub mod harmonic; // Pitch/key linking and stage key overrides
pub mod io;
pub mod key; // Key and note calculus

pub use config::StudioConfig;
pub use deck::Deck;
pub use engine::{PlaybackEngine, TransportState};
pub use key::{calculate_semitones, format_key, normalize_key, transpose_key, Key, KeyPreference};

pub const MAX_BLOCK_SIZE: usize = 2048;
