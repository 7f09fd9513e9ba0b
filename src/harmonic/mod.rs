//! Per-song pitch/key linking, session-only stage key overrides, and the
//! singer-range guard.

pub mod safe_pitch;
pub mod session;
pub mod song;

pub use safe_pitch::SafePitchPolicy;
pub use session::{HarmonicSync, LinkState, OctaveShift, SyncPolicy};
pub use song::{MemorySongStore, SongId, SongRecord, SongStore, SongUpdate, Transposition};
