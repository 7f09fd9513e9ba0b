use std::sync::Arc;

use crate::{
    engine::{clock::Clock, params::PITCH_RANGE, EngineEvent, PlaybackEngine, TransportState},
    error::{FetchError, LoadError},
    graph::PlayerGraph,
    io::{AudioSource, DecodedBuffer, SourceFetcher},
};

/*
Token-Keyed Loading
===================

Loading is split so that the slow part (fetch + decode) can run anywhere:

    begin_load(source) ──► Started(token) ──► host fetches ──► complete_load(token, bytes)
                                                                       │
                                                                decode │
                                                                       ▼
                                                              finish_load(token, buffer)

Every request gets the next token from a monotonically increasing counter.
Only the latest token may commit. A slow response for an older request gets
`LoadOutcome::Stale` and is dropped without touching the engine; `reset`
clears the pending token so nothing already in flight can land afterwards.

Requests for the source that is already loaded are no-ops unless forced.
Requests for the source already in flight are coalesced onto the pending
token, so at most one fetch per source runs at a time.
*/

/// Identifies one load request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// What `begin_load` decided to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadRequest {
    /// A new request; fetch and hand the result back with this token.
    Started(LoadToken),
    /// The same source is already loaded; nothing to fetch.
    AlreadyLoaded,
    /// The same source is already being fetched under this token.
    Coalesced(LoadToken),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The buffer is committed and the engine is `Ready`.
    Ready,
    AlreadyLoaded,
    Coalesced,
    /// The result belonged to a superseded request and was discarded.
    Stale,
}

pub(crate) struct PendingLoad {
    pub(crate) token: LoadToken,
    pub(crate) source: AudioSource,
}

/// The source, its samples and the graph playing them, set and cleared as one.
pub(crate) struct LoadedMedia {
    pub(crate) source: AudioSource,
    pub(crate) buffer: DecodedBuffer,
    pub(crate) graph: PlayerGraph,
}

impl<C: Clock> PlaybackEngine<C> {
    /// Register a load request. The pitch becomes `initial_pitch` (clamped
    /// to ±24); tempo, fine tune and gain keep whatever was set before.
    pub fn begin_load(&mut self, source: AudioSource, initial_pitch: i32, force: bool) -> LoadRequest {
        let pitch = clamp_pitch(initial_pitch);

        if let Some(pending) = &self.pending {
            if pending.source == source {
                log::debug!("load of {source} coalesced onto pending request");
                self.params.pitch_semitones = pitch;
                return LoadRequest::Coalesced(pending.token);
            }
        }

        let loaded_same = self.media.as_ref().is_some_and(|m| m.source == source);
        if loaded_same && !force && self.pending.is_none() {
            log::debug!("{source} already loaded");
            self.apply_pitch(pitch);
            return LoadRequest::AlreadyLoaded;
        }

        // Tear down whatever is playing before a new request starts.
        self.progress.disarm();
        self.media = None;
        self.transport.rewind();

        self.params.pitch_semitones = pitch;

        let token = LoadToken(self.next_token);
        self.next_token += 1;
        log::info!("loading {source} (pitch {pitch:+})");
        self.pending = Some(PendingLoad { token, source });
        self.state = TransportState::Loading;
        LoadRequest::Started(token)
    }

    /// Hand back fetched bytes for `token`. Decoding happens here.
    pub fn complete_load(
        &mut self,
        token: LoadToken,
        fetched: Result<Vec<u8>, FetchError>,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.is_current(token) {
            log::debug!("discarding stale fetch result {token:?}");
            return Ok(LoadOutcome::Stale);
        }
        let decoded = fetched
            .map_err(LoadError::from)
            .and_then(|bytes| DecodedBuffer::from_wav_bytes(&bytes).map_err(LoadError::from));
        self.finish_load(token, decoded)
    }

    /// Commit a decoded buffer (or failure) for `token`.
    pub fn finish_load(
        &mut self,
        token: LoadToken,
        decoded: Result<DecodedBuffer, LoadError>,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.is_current(token) {
            log::debug!("discarding stale load result {token:?}");
            return Ok(LoadOutcome::Stale);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(LoadOutcome::Stale);
        };

        match decoded {
            Ok(buffer) => {
                let mut graph = PlayerGraph::new(&buffer, &self.config, self.sample_rate);
                self.apply_params(&mut graph);
                let duration_seconds = buffer.duration_seconds();
                log::info!("loaded {} ({duration_seconds:.2}s)", pending.source);

                self.events.push_back(EngineEvent::Loaded {
                    source: pending.source.clone(),
                    duration_seconds,
                });
                self.media = Some(LoadedMedia {
                    source: pending.source,
                    buffer,
                    graph,
                });
                self.transport.rewind();
                self.state = TransportState::Ready;
                Ok(LoadOutcome::Ready)
            }
            Err(err) => {
                log::warn!("failed to load {}: {err}", pending.source);
                self.events.push_back(EngineEvent::LoadFailed {
                    source: pending.source,
                    message: err.to_string(),
                });
                self.state = TransportState::Idle;
                Err(err)
            }
        }
    }

    /// Fetch, decode and commit in one call.
    pub fn load(
        &mut self,
        source: AudioSource,
        initial_pitch: i32,
        force: bool,
        fetcher: &impl SourceFetcher,
    ) -> Result<LoadOutcome, LoadError> {
        match self.begin_load(source.clone(), initial_pitch, force) {
            LoadRequest::AlreadyLoaded => Ok(LoadOutcome::AlreadyLoaded),
            LoadRequest::Coalesced(_) => Ok(LoadOutcome::Coalesced),
            LoadRequest::Started(token) => {
                let fetched = fetcher.fetch(&source);
                self.complete_load(token, fetched)
            }
        }
    }

    /// Install an already-decoded buffer, replacing whatever is loaded.
    pub fn load_buffer(&mut self, source: AudioSource, buffer: DecodedBuffer, initial_pitch: i32) -> LoadOutcome {
        match self.begin_load(source, initial_pitch, true) {
            LoadRequest::Started(token) | LoadRequest::Coalesced(token) => {
                self.finish_load(token, Ok(buffer)).unwrap_or(LoadOutcome::Stale)
            }
            LoadRequest::AlreadyLoaded => LoadOutcome::AlreadyLoaded,
        }
    }

    pub fn pending_load(&self) -> Option<LoadToken> {
        self.pending.as_ref().map(|p| p.token)
    }

    /// Shared handle to the loaded samples.
    pub fn buffer(&self) -> Option<Arc<[f32]>> {
        self.media.as_ref().map(|m| m.buffer.samples())
    }

    fn is_current(&self, token: LoadToken) -> bool {
        self.pending.as_ref().is_some_and(|p| p.token == token)
    }
}

fn clamp_pitch(pitch: i32) -> i32 {
    let clamped = pitch.clamp(PITCH_RANGE.min as i32, PITCH_RANGE.max as i32);
    if clamped != pitch {
        log::warn!("initial pitch {pitch:+} clamped to {clamped:+}");
    }
    clamped
}
