use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::params::PITCH_RANGE,
    error::{StoreError, SyncError},
    harmonic::{
        safe_pitch::SafePitchPolicy,
        song::{SongId, SongRecord, SongStore, SongUpdate, Transposition},
    },
    key::{calculate_semitones, normalize_key, KeyPreference},
};

/*
Harmonic Sync
=============

Each song carries a stored `pitch` and `target key`. Harmonic sync decides
which pair is in effect and where edits go.

Link States
-----------

  Linked          Pitch and target key are the stored values. Changing one
                  recomputes the other from the original key, and both are
                  written to the store together.

  Unlinked        The user detached them. Edits stay local to this session
                  and pitch and key move independently.

  SessionLocked   The key is confirmed and the "prevent stage key overwrite"
                  policy is on. Edits go to a session override that is never
                  written back, so a performer can preview another key
                  without touching the confirmed arrangement.

Resolution Order
----------------

    locked and override present  →  session override
    linked                       →  stored pair
    otherwise                    →  local pair (seeded from the store, and
                                    re-seeded whenever the stored pair
                                    changes while unlinked)

Overrides are created lazily the first time a locked song is resolved and
seeded from its stored pair. Local state is dropped by `forget` when a song
is unloaded; `end_session` drops everything.
*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Linked,
    Unlinked,
    SessionLocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OctaveShift {
    Up,
    Down,
}

impl OctaveShift {
    pub fn semitones(self) -> i32 {
        match self {
            OctaveShift::Up => 12,
            OctaveShift::Down => -12,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncPolicy {
    pub prevent_stage_key_overwrite: bool,
    pub key_preference: KeyPreference,
    pub safe_pitch: SafePitchPolicy,
}

#[derive(Clone, Copy, Debug)]
struct LocalState {
    current: Transposition,
    // stored pair the local state was last seeded from
    seen: Transposition,
}

impl LocalState {
    fn seeded(stored: Transposition) -> Self {
        Self {
            current: stored,
            seen: stored,
        }
    }
}

#[derive(Debug, Default)]
pub struct HarmonicSync {
    policy: SyncPolicy,
    overrides: HashMap<SongId, Transposition>,
    local: HashMap<SongId, LocalState>,
}

impl HarmonicSync {
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            policy,
            overrides: HashMap::new(),
            local: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: SyncPolicy) {
        self.policy = policy;
    }

    pub fn is_stage_key_locked(&self, song: &SongRecord) -> bool {
        self.policy.prevent_stage_key_overwrite && song.is_key_confirmed
    }

    pub fn link_state(&self, song: &SongRecord) -> LinkState {
        if self.is_stage_key_locked(song) {
            LinkState::SessionLocked
        } else if song.is_pitch_linked {
            LinkState::Linked
        } else {
            LinkState::Unlinked
        }
    }

    pub fn session_override(&self, id: &SongId) -> Option<Transposition> {
        self.overrides.get(id).copied()
    }

    /// Effective pair without seeding any session state.
    pub fn effective(&self, song: &SongRecord) -> Transposition {
        if self.is_stage_key_locked(song) {
            if let Some(over) = self.overrides.get(&song.id) {
                return *over;
            }
        }
        let stored = song.stored_transposition();
        if song.is_pitch_linked {
            return stored;
        }
        match self.local.get(&song.id) {
            Some(local) if local.seen == stored => local.current,
            _ => stored,
        }
    }

    /// Effective pair, seeding the session override and local state the
    /// first time a song is seen.
    pub fn resolve_effective(&mut self, song: &SongRecord) -> Transposition {
        let stored = song.stored_transposition();
        let state = self.link_state(song);

        if state == LinkState::SessionLocked {
            self.overrides.entry(song.id.clone()).or_insert(stored);
        }

        let local = self
            .local
            .entry(song.id.clone())
            .or_insert_with(|| LocalState::seeded(stored));
        match state {
            LinkState::Linked => *local = LocalState::seeded(stored),
            LinkState::Unlinked if local.seen != stored => {
                log::debug!("song {} changed in store, resyncing local pair", song.id);
                *local = LocalState::seeded(stored);
            }
            _ => {}
        }

        self.effective(song)
    }

    pub fn set_pitch<S: SongStore>(
        &mut self,
        store: &mut S,
        id: &SongId,
        pitch: i32,
    ) -> Result<Transposition, SyncError> {
        PITCH_RANGE.check(pitch as f64)?;
        let song = fetch(store, id)?;
        let current = self.resolve_effective(&song);
        self.policy.safe_pitch.check(
            song.highest_note.as_deref(),
            current.pitch,
            pitch,
            self.policy.key_preference,
        )?;

        let derived = Transposition {
            pitch,
            target_key: song.original_key().transposed(pitch, self.policy.key_preference),
        };

        match self.link_state(&song) {
            LinkState::SessionLocked => {
                self.overrides.insert(id.clone(), derived);
                self.mirror_local(&song, derived);
                log::debug!("song {id}: session override {derived}");
            }
            LinkState::Linked => {
                store.apply(id, &SongUpdate::transposition(derived))?;
            }
            LinkState::Unlinked => {
                self.with_local(&song, |local| local.pitch = pitch);
            }
        }
        self.current(store, id)
    }

    pub fn set_target_key<S: SongStore>(
        &mut self,
        store: &mut S,
        id: &SongId,
        target_key: &str,
    ) -> Result<Transposition, SyncError> {
        let song = fetch(store, id)?;
        let current = self.resolve_effective(&song);
        let target = normalize_key(target_key);
        let pitch = calculate_semitones(&song.original_key().to_string(), &target.to_string());
        let derived = Transposition {
            pitch,
            target_key: target,
        };

        match self.link_state(&song) {
            LinkState::SessionLocked => {
                self.check_safe(&song, current.pitch, pitch)?;
                self.overrides.insert(id.clone(), derived);
                self.mirror_local(&song, derived);
                log::debug!("song {id}: session override {derived}");
            }
            LinkState::Linked => {
                self.check_safe(&song, current.pitch, pitch)?;
                let update = SongUpdate {
                    transposition: Some(derived),
                    is_key_confirmed: Some(true),
                    ..SongUpdate::default()
                };
                store.apply(id, &update)?;
            }
            LinkState::Unlinked => {
                self.with_local(&song, |local| local.target_key = target);
            }
        }
        self.current(store, id)
    }

    /// Unlinking writes pitch 0 and the original key; linking writes the
    /// pitch implied by the key currently shown. For a locked song only the
    /// flag is written.
    pub fn set_is_pitch_linked<S: SongStore>(
        &mut self,
        store: &mut S,
        id: &SongId,
        linked: bool,
    ) -> Result<Transposition, SyncError> {
        let song = fetch(store, id)?;
        let shown = self.resolve_effective(&song);
        let original = song.original_key();

        let transposition = if self.is_stage_key_locked(&song) {
            None
        } else if linked {
            let pitch = calculate_semitones(&original.to_string(), &shown.target_key.to_string());
            Some(Transposition {
                pitch,
                target_key: shown.target_key,
            })
        } else {
            Some(Transposition {
                pitch: 0,
                target_key: original,
            })
        };

        let update = SongUpdate {
            transposition,
            is_pitch_linked: Some(linked),
            ..SongUpdate::default()
        };
        store.apply(id, &update)?;

        // Local state restarts from what was just stored.
        if let Some(updated) = store.song(id) {
            self.local
                .insert(id.clone(), LocalState::seeded(updated.stored_transposition()));
        }
        log::debug!("song {id}: pitch link {}", if linked { "on" } else { "off" });
        self.current(store, id)
    }

    /// Move the effective pitch by an octave. Fails without changing
    /// anything when the result would leave ±24.
    pub fn shift_octave<S: SongStore>(
        &mut self,
        store: &mut S,
        id: &SongId,
        shift: OctaveShift,
    ) -> Result<Transposition, SyncError> {
        let song = fetch(store, id)?;
        let current = self.resolve_effective(&song);
        let pitch = current.pitch.saturating_add(shift.semitones());
        if let Err(err) = PITCH_RANGE.check(pitch as f64) {
            log::warn!("song {id}: maximum transposition range reached ({pitch:+})");
            return Err(err.into());
        }
        self.set_pitch(store, id, pitch)
    }

    /// Drop local state for an unloaded song. Session overrides are kept.
    pub fn forget(&mut self, id: &SongId) {
        self.local.remove(id);
    }

    pub fn end_session(&mut self) {
        self.overrides.clear();
        self.local.clear();
    }

    fn current<S: SongStore>(&mut self, store: &S, id: &SongId) -> Result<Transposition, SyncError> {
        let song = fetch(store, id)?;
        Ok(self.resolve_effective(&song))
    }

    fn check_safe(&self, song: &SongRecord, current: i32, requested: i32) -> Result<(), SyncError> {
        self.policy.safe_pitch.check(
            song.highest_note.as_deref(),
            current,
            requested,
            self.policy.key_preference,
        )
    }

    fn mirror_local(&mut self, song: &SongRecord, value: Transposition) {
        self.with_local(song, |local| *local = value);
    }

    fn with_local(&mut self, song: &SongRecord, edit: impl FnOnce(&mut Transposition)) {
        let stored = song.stored_transposition();
        let local = self
            .local
            .entry(song.id.clone())
            .or_insert_with(|| LocalState::seeded(stored));
        edit(&mut local.current);
    }
}

fn fetch<S: SongStore>(store: &S, id: &SongId) -> Result<SongRecord, SyncError> {
    store
        .song(id)
        .ok_or_else(|| SyncError::Store(StoreError::UnknownSong(id.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonic::song::MemorySongStore;

    fn store_with(song: SongRecord) -> (MemorySongStore, SongId) {
        let id = song.id.clone();
        (std::iter::once(song).collect(), id)
    }

    #[test]
    fn linked_set_target_key_confirms() {
        let (mut store, id) = store_with(SongRecord::new("a", "C"));
        let mut sync = HarmonicSync::default();

        let effective = sync.set_target_key(&mut store, &id, "Eb").unwrap();
        assert_eq!(effective.pitch, 3);

        let song = store.get(&id).unwrap();
        assert_eq!(song.pitch, 3);
        assert_eq!(song.target_key.as_deref(), Some("Eb"));
        assert!(song.is_key_confirmed);
    }

    #[test]
    fn linked_set_pitch_writes_the_pair() {
        let (mut store, id) = store_with(SongRecord::new("a", "A"));
        let mut sync = HarmonicSync::default();

        sync.set_pitch(&mut store, &id, -2).unwrap();
        let song = store.get(&id).unwrap();
        assert_eq!(song.pitch, -2);
        assert_eq!(song.target_key.as_deref(), Some("G"));
        assert!(!song.is_key_confirmed);
    }

    #[test]
    fn flats_preference_spells_derived_keys() {
        let (mut store, id) = store_with(SongRecord::new("a", "C"));
        let mut sync = HarmonicSync::new(SyncPolicy {
            key_preference: KeyPreference::Flats,
            ..SyncPolicy::default()
        });
        sync.set_pitch(&mut store, &id, 1).unwrap();
        assert_eq!(store.get(&id).unwrap().target_key.as_deref(), Some("Db"));
    }

    #[test]
    fn unlinked_edits_stay_local_and_independent() {
        let song = SongRecord {
            is_pitch_linked: false,
            ..SongRecord::new("a", "D")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::default();

        let after_pitch = sync.set_pitch(&mut store, &id, 5).unwrap();
        assert_eq!(after_pitch.pitch, 5);
        assert_eq!(after_pitch.target_key.to_string(), "D");

        let after_key = sync.set_target_key(&mut store, &id, "F").unwrap();
        assert_eq!(after_key.pitch, 5);
        assert_eq!(after_key.target_key.to_string(), "F");
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn unlinked_local_state_resyncs_on_store_change() {
        let song = SongRecord {
            is_pitch_linked: false,
            ..SongRecord::new("a", "D")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::default();
        sync.set_pitch(&mut store, &id, 5).unwrap();

        let update = SongUpdate::transposition(Transposition {
            pitch: 2,
            target_key: normalize_key("E"),
        });
        store.apply(&id, &update).unwrap();

        let song = store.song(&id).unwrap();
        let effective = sync.resolve_effective(&song);
        assert_eq!(effective.pitch, 2);
        assert_eq!(effective.target_key.to_string(), "E");
    }

    #[test]
    fn unlinking_snaps_store_back_to_original() {
        let song = SongRecord {
            pitch: 4,
            target_key: Some("E".into()),
            ..SongRecord::new("a", "C")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::default();

        let effective = sync.set_is_pitch_linked(&mut store, &id, false).unwrap();
        let song = store.get(&id).unwrap();
        assert_eq!(song.pitch, 0);
        assert_eq!(song.target_key.as_deref(), Some("C"));
        assert!(!song.is_pitch_linked);
        assert_eq!(effective.pitch, 0);
    }

    #[test]
    fn linking_keeps_the_visible_key() {
        let song = SongRecord {
            is_pitch_linked: false,
            ..SongRecord::new("a", "C")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::default();
        sync.set_target_key(&mut store, &id, "A").unwrap();

        let effective = sync.set_is_pitch_linked(&mut store, &id, true).unwrap();
        let song = store.get(&id).unwrap();
        assert_eq!(song.pitch, -3);
        assert_eq!(song.target_key.as_deref(), Some("A"));
        assert!(song.is_pitch_linked);
        assert_eq!(effective.target_key.to_string(), "A");
    }

    #[test]
    fn locked_edits_go_to_the_session_only() {
        let song = SongRecord {
            is_key_confirmed: true,
            pitch: 2,
            target_key: Some("D".into()),
            ..SongRecord::new("a", "C")
        };
        let (mut store, id) = store_with(song.clone());
        let mut sync = HarmonicSync::new(SyncPolicy {
            prevent_stage_key_overwrite: true,
            ..SyncPolicy::default()
        });

        assert_eq!(sync.link_state(&song), LinkState::SessionLocked);
        let effective = sync.set_pitch(&mut store, &id, 7).unwrap();
        assert_eq!(effective.pitch, 7);
        assert_eq!(effective.target_key.to_string(), "G");

        assert_eq!(store.writes(), 0);
        assert_eq!(store.get(&id), Some(&song));
        assert_eq!(sync.session_override(&id).map(|t| t.pitch), Some(7));
    }

    #[test]
    fn overrides_are_seeded_from_the_store() {
        let song = SongRecord {
            is_key_confirmed: true,
            pitch: -1,
            target_key: Some("B".into()),
            ..SongRecord::new("a", "C")
        };
        let mut sync = HarmonicSync::new(SyncPolicy {
            prevent_stage_key_overwrite: true,
            ..SyncPolicy::default()
        });
        assert_eq!(sync.session_override(&song.id), None);

        let effective = sync.resolve_effective(&song);
        assert_eq!(effective.pitch, -1);
        assert_eq!(sync.session_override(&song.id), Some(effective));
    }

    #[test]
    fn octave_shift_respects_the_bound() {
        let song = SongRecord {
            pitch: 20,
            ..SongRecord::new("a", "C")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::default();

        let err = sync.shift_octave(&mut store, &id, OctaveShift::Up).unwrap_err();
        assert!(matches!(err, SyncError::OutOfRange(_)));
        assert_eq!(store.get(&id).unwrap().pitch, 20);

        let down = sync.shift_octave(&mut store, &id, OctaveShift::Down).unwrap();
        assert_eq!(down.pitch, 8);
        assert_eq!(down.target_key.to_string(), "G#");
    }

    #[test]
    fn out_of_range_pitch_is_rejected() {
        let (mut store, id) = store_with(SongRecord::new("a", "C"));
        let mut sync = HarmonicSync::default();
        assert!(matches!(
            sync.set_pitch(&mut store, &id, -25),
            Err(SyncError::OutOfRange(_))
        ));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn safe_pitch_blocks_increases() {
        let song = SongRecord {
            highest_note: Some("F3".into()),
            ..SongRecord::new("a", "C")
        };
        let (mut store, id) = store_with(song);
        let mut sync = HarmonicSync::new(SyncPolicy {
            safe_pitch: SafePitchPolicy::enabled("G3"),
            ..SyncPolicy::default()
        });

        sync.set_pitch(&mut store, &id, 2).unwrap();
        let err = sync.set_pitch(&mut store, &id, 3).unwrap_err();
        assert!(matches!(err, SyncError::SafePitchExceeded { pitch: 3, .. }));
        assert_eq!(store.get(&id).unwrap().pitch, 2);

        sync.set_pitch(&mut store, &id, -5).unwrap();
    }

    #[test]
    fn unknown_song_is_a_store_error() {
        let mut store = MemorySongStore::new();
        let mut sync = HarmonicSync::default();
        assert!(matches!(
            sync.set_pitch(&mut store, &"nope".into(), 1),
            Err(SyncError::Store(StoreError::UnknownSong(_)))
        ));
    }
}
