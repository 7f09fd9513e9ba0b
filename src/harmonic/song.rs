use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    io::AudioSource,
    key::{normalize_key, Key},
};

/// Key assumed for songs whose original key was never entered.
pub const DEFAULT_ORIGINAL_KEY: &str = "C";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SongId(String);

impl SongId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Pitch and target key, always handled as a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transposition {
    pub pitch: i32,
    pub target_key: Key,
}

impl fmt::Display for Transposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:+})", self.target_key, self.pitch)
    }
}

/// A song as the store keeps it. Key fields are free text and are only
/// interpreted through [`normalize_key`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SongRecord {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub audio_url: Option<AudioSource>,
    pub original_key: Option<String>,
    pub target_key: Option<String>,
    pub pitch: i32,
    pub is_pitch_linked: bool,
    pub is_key_confirmed: bool,
    /// Highest sung note in the original key, e.g. "E4".
    pub highest_note: Option<String>,
}

impl Default for SongRecord {
    fn default() -> Self {
        Self {
            id: SongId::new(""),
            title: String::new(),
            artist: String::new(),
            audio_url: None,
            original_key: None,
            target_key: None,
            pitch: 0,
            is_pitch_linked: true,
            is_key_confirmed: false,
            highest_note: None,
        }
    }
}

impl SongRecord {
    pub fn new(id: impl Into<SongId>, original_key: &str) -> Self {
        Self {
            id: id.into(),
            original_key: Some(original_key.to_string()),
            ..Self::default()
        }
    }

    /// Original key; missing or blank means C.
    pub fn original_key(&self) -> Key {
        match non_blank(&self.original_key) {
            Some(key) => normalize_key(key),
            None => normalize_key(DEFAULT_ORIGINAL_KEY),
        }
    }

    /// Stored target key; missing or blank falls back to the original.
    pub fn stored_target_key(&self) -> Key {
        match non_blank(&self.target_key) {
            Some(key) => normalize_key(key),
            None => self.original_key(),
        }
    }

    pub fn stored_transposition(&self) -> Transposition {
        Transposition {
            pitch: self.pitch,
            target_key: self.stored_target_key(),
        }
    }

    pub fn apply(&mut self, update: &SongUpdate) {
        if let Some(t) = update.transposition {
            self.pitch = t.pitch;
            self.target_key = Some(t.target_key.to_string());
        }
        if let Some(linked) = update.is_pitch_linked {
            self.is_pitch_linked = linked;
        }
        if let Some(confirmed) = update.is_key_confirmed {
            self.is_key_confirmed = confirmed;
        }
    }
}

impl From<String> for SongId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Partial write. Pitch and target key travel together in `transposition`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SongUpdate {
    pub transposition: Option<Transposition>,
    pub is_pitch_linked: Option<bool>,
    pub is_key_confirmed: Option<bool>,
}

impl SongUpdate {
    pub fn transposition(transposition: Transposition) -> Self {
        Self {
            transposition: Some(transposition),
            ..Self::default()
        }
    }
}

/// Where song records live. Writes are the only way harmonic sync changes
/// stored data.
pub trait SongStore {
    fn song(&self, id: &SongId) -> Option<SongRecord>;

    fn apply(&mut self, id: &SongId, update: &SongUpdate) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemorySongStore {
    songs: HashMap<SongId, SongRecord>,
    writes: usize,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, song: SongRecord) {
        self.songs.insert(song.id.clone(), song);
    }

    pub fn get(&self, id: &SongId) -> Option<&SongRecord> {
        self.songs.get(id)
    }

    /// Number of updates applied so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

impl FromIterator<SongRecord> for MemorySongStore {
    fn from_iter<I: IntoIterator<Item = SongRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for song in iter {
            store.insert(song);
        }
        store
    }
}

impl SongStore for MemorySongStore {
    fn song(&self, id: &SongId) -> Option<SongRecord> {
        self.songs.get(id).cloned()
    }

    fn apply(&mut self, id: &SongId, update: &SongUpdate) -> Result<(), StoreError> {
        let song = self
            .songs
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSong(id.clone()))?;
        song.apply(update);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back() {
        let song = SongRecord {
            id: "a".into(),
            ..SongRecord::default()
        };
        assert_eq!(song.original_key().to_string(), "C");
        assert_eq!(song.stored_target_key().to_string(), "C");

        let song = SongRecord {
            target_key: Some("  ".into()),
            ..SongRecord::new("b", "d major")
        };
        assert_eq!(song.stored_target_key().to_string(), "D");
    }

    #[test]
    fn malformed_stored_keys_become_tbc() {
        let song = SongRecord::new("a", "H#");
        assert!(song.original_key().is_tbc());
    }

    #[test]
    fn updates_write_pitch_and_key_together() {
        let mut store: MemorySongStore = [SongRecord::new("a", "C")].into_iter().collect();
        let id = SongId::new("a");
        let update = SongUpdate::transposition(Transposition {
            pitch: 3,
            target_key: normalize_key("Eb"),
        });
        store.apply(&id, &update).unwrap();

        let song = store.get(&id).unwrap();
        assert_eq!(song.pitch, 3);
        assert_eq!(song.target_key.as_deref(), Some("Eb"));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn unknown_songs_are_rejected() {
        let mut store = MemorySongStore::new();
        let err = store.apply(&"ghost".into(), &SongUpdate::default()).unwrap_err();
        assert_eq!(err, StoreError::UnknownSong("ghost".into()));
    }
}
