//! A song-aware front end over the engine.
//!
//! The deck runs the full flow for one loaded song: harmonic sync resolves
//! the effective transposition, the engine loads the audio with that pitch,
//! and every later pitch/key edit goes through sync first and is then
//! applied to the engine.

use crate::{
    config::StudioConfig,
    engine::{Clock, LoadOutcome, LoadRequest, PlaybackEngine},
    error::DeckError,
    harmonic::{HarmonicSync, LinkState, OctaveShift, SongId, SongRecord, SongStore, Transposition},
    io::{AudioSource, SourceFetcher},
};

pub struct Deck<C: Clock, S: SongStore> {
    engine: PlaybackEngine<C>,
    sync: HarmonicSync,
    store: S,
    current: Option<SongId>,
}

impl<C: Clock, S: SongStore> Deck<C, S> {
    pub fn new(engine: PlaybackEngine<C>, sync: HarmonicSync, store: S) -> Self {
        Self {
            engine,
            sync,
            store,
            current: None,
        }
    }

    pub fn from_config(clock: C, config: &StudioConfig, sample_rate: f32, store: S) -> Self {
        Self::new(
            PlaybackEngine::new(clock, config.engine, sample_rate),
            HarmonicSync::new(config.sync.clone()),
            store,
        )
    }

    pub fn engine(&self) -> &PlaybackEngine<C> {
        &self.engine
    }

    /// Direct transport access (play, seek, tempo, rendering).
    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<C> {
        &mut self.engine
    }

    pub fn sync(&self) -> &HarmonicSync {
        &self.sync
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_id(&self) -> Option<&SongId> {
        self.current.as_ref()
    }

    pub fn current_song(&self) -> Option<SongRecord> {
        self.current.as_ref().and_then(|id| self.store.song(id))
    }

    pub fn link_state(&self) -> Option<LinkState> {
        self.current_song().map(|song| self.sync.link_state(&song))
    }

    pub fn effective(&self) -> Option<Transposition> {
        self.current_song().map(|song| self.sync.effective(&song))
    }

    /// Start loading `id` at its effective pitch. The caller fetches and
    /// hands the bytes to [`PlaybackEngine::complete_load`].
    pub fn begin_song(&mut self, id: &SongId) -> Result<(LoadRequest, AudioSource), DeckError> {
        let song = self
            .store
            .song(id)
            .ok_or_else(|| DeckError::UnknownSong(id.clone()))?;
        let source = song
            .audio_url
            .clone()
            .ok_or_else(|| DeckError::NoAudio(id.clone()))?;

        if let Some(previous) = self.current.take() {
            if &previous != id {
                self.sync.forget(&previous);
            }
        }
        let effective = self.sync.resolve_effective(&song);
        log::info!("song {id}: {} at {effective}", song.title);

        let request = self.engine.begin_load(source.clone(), effective.pitch, false);
        self.current = Some(id.clone());
        Ok((request, source))
    }

    /// Resolve, fetch, decode and commit `id` in one call.
    pub fn load_song(&mut self, id: &SongId, fetcher: &impl SourceFetcher) -> Result<LoadOutcome, DeckError> {
        let (request, source) = self.begin_song(id)?;
        let outcome = match request {
            LoadRequest::AlreadyLoaded => LoadOutcome::AlreadyLoaded,
            LoadRequest::Coalesced(_) => LoadOutcome::Coalesced,
            LoadRequest::Started(token) => self.engine.complete_load(token, fetcher.fetch(&source))?,
        };
        Ok(outcome)
    }

    pub fn set_pitch(&mut self, pitch: i32) -> Result<Transposition, DeckError> {
        let id = self.current.clone().ok_or(DeckError::NoSong)?;
        let effective = self.sync.set_pitch(&mut self.store, &id, pitch)?;
        self.apply(effective)
    }

    pub fn set_target_key(&mut self, key: &str) -> Result<Transposition, DeckError> {
        let id = self.current.clone().ok_or(DeckError::NoSong)?;
        let effective = self.sync.set_target_key(&mut self.store, &id, key)?;
        self.apply(effective)
    }

    pub fn set_is_pitch_linked(&mut self, linked: bool) -> Result<Transposition, DeckError> {
        let id = self.current.clone().ok_or(DeckError::NoSong)?;
        let effective = self.sync.set_is_pitch_linked(&mut self.store, &id, linked)?;
        self.apply(effective)
    }

    pub fn shift_octave(&mut self, shift: OctaveShift) -> Result<Transposition, DeckError> {
        let id = self.current.clone().ok_or(DeckError::NoSong)?;
        let effective = self.sync.shift_octave(&mut self.store, &id, shift)?;
        self.apply(effective)
    }

    /// Reset the engine and drop the song's local state. Session overrides
    /// survive until [`Deck::end_session`].
    pub fn unload(&mut self) {
        self.engine.reset();
        if let Some(id) = self.current.take() {
            self.sync.forget(&id);
        }
    }

    pub fn end_session(&mut self) {
        self.unload();
        self.sync.end_session();
    }

    fn apply(&mut self, effective: Transposition) -> Result<Transposition, DeckError> {
        self.engine.set_pitch(effective.pitch)?;
        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{ManualClock, TransportState},
        error::FetchError,
        harmonic::{MemorySongStore, SyncPolicy},
        io::DecodedBuffer,
    };

    fn wav(seconds: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..(seconds * 8_000.0) as usize {
                writer.write_sample(((i % 40) as i16 - 20) * 500).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn deck(policy: SyncPolicy, song: SongRecord) -> Deck<ManualClock, MemorySongStore> {
        let config = StudioConfig {
            sync: policy,
            ..StudioConfig::default()
        };
        let store = std::iter::once(song).collect();
        Deck::from_config(ManualClock::new(), &config, 48_000.0, store)
    }

    fn fetcher() -> impl Fn(&AudioSource) -> Result<Vec<u8>, FetchError> {
        |_: &AudioSource| Ok(wav(1.0))
    }

    #[test]
    fn loads_at_the_effective_pitch() {
        let song = SongRecord {
            audio_url: Some("song.wav".into()),
            pitch: 3,
            target_key: Some("Eb".into()),
            ..SongRecord::new("a", "C")
        };
        let mut deck = deck(SyncPolicy::default(), song);

        let outcome = deck.load_song(&"a".into(), &fetcher()).unwrap();
        assert_eq!(outcome, LoadOutcome::Ready);
        assert_eq!(deck.engine().state(), TransportState::Ready);
        assert_eq!(deck.engine().current_pitch(), 3);
        assert_eq!(deck.engine().applied_detune_cents(), Some(300.0));
    }

    #[test]
    fn key_changes_reach_the_engine() {
        let song = SongRecord {
            audio_url: Some("song.wav".into()),
            ..SongRecord::new("a", "G")
        };
        let mut deck = deck(SyncPolicy::default(), song);
        deck.load_song(&"a".into(), &fetcher()).unwrap();

        let effective = deck.set_target_key("A").unwrap();
        assert_eq!(effective.pitch, 2);
        assert_eq!(deck.engine().current_pitch(), 2);
        assert!(deck.current_song().unwrap().is_key_confirmed);

        let shifted = deck.shift_octave(OctaveShift::Up).unwrap();
        assert_eq!(shifted.pitch, 14);
        assert_eq!(deck.engine().applied_detune_cents(), Some(1400.0));
    }

    #[test]
    fn song_without_audio_is_reported() {
        let mut deck = deck(SyncPolicy::default(), SongRecord::new("a", "C"));
        assert!(matches!(
            deck.load_song(&"a".into(), &fetcher()),
            Err(DeckError::NoAudio(_))
        ));
        assert!(matches!(deck.set_pitch(1), Err(DeckError::NoSong)));
    }

    #[test]
    fn unload_keeps_session_overrides() {
        let song = SongRecord {
            audio_url: Some("song.wav".into()),
            is_key_confirmed: true,
            ..SongRecord::new("a", "C")
        };
        let policy = SyncPolicy {
            prevent_stage_key_overwrite: true,
            ..SyncPolicy::default()
        };
        let mut deck = deck(policy, song);
        deck.load_song(&"a".into(), &fetcher()).unwrap();
        deck.set_pitch(5).unwrap();
        deck.unload();

        assert_eq!(deck.engine().state(), TransportState::Idle);
        assert_eq!(deck.sync().session_override(&"a".into()).map(|t| t.pitch), Some(5));

        deck.load_song(&"a".into(), &fetcher()).unwrap();
        assert_eq!(deck.engine().current_pitch(), 5);
        assert_eq!(deck.store().get(&"a".into()).unwrap().pitch, 0);

        deck.end_session();
        assert_eq!(deck.sync().session_override(&"a".into()), None);
    }

    #[test]
    fn decoded_buffers_can_be_installed_directly() {
        let mut deck = deck(SyncPolicy::default(), SongRecord::new("a", "C"));
        let buffer = DecodedBuffer::from_samples(vec![0.0; 4_800], 48_000, 1);
        deck.engine_mut().load_buffer("raw".into(), buffer, 0);
        assert_eq!(deck.engine().duration_seconds(), 0.1);
    }
}
