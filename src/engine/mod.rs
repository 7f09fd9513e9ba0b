//! The playback engine: one buffer, one player graph, one transport.
//!
//! Every operation takes `&mut self` and returns immediately. The only slow
//! work, fetching and decoding, is either done by the caller between
//! [`PlaybackEngine::begin_load`] and [`PlaybackEngine::complete_load`], or
//! inline by [`PlaybackEngine::load`].

use std::collections::VecDeque;

pub mod clock;
pub mod load;
pub mod params;
pub mod scheduler;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use load::{LoadOutcome, LoadRequest, LoadToken};
pub use params::PlaybackParameters;
pub use scheduler::{ProgressClock, ProgressSample, TickOutcome, TickToken};
pub use transport::TransportState;

use self::{
    load::{LoadedMedia, PendingLoad},
    params::{FINE_TUNE_RANGE, GAIN_RANGE, PITCH_RANGE, RATIO_RANGE, THRESHOLD_RANGE},
    transport::Transport,
};
use crate::{
    config::EngineConfig,
    dsp::AnalysisSnapshot,
    error::EngineError,
    graph::{GraphNode, PlayerGraph, RenderCtx},
    io::AudioSource,
};

/// Notifications for the host, collected with [`PlaybackEngine::drain_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Loaded {
        source: AudioSource,
        duration_seconds: f64,
    },
    LoadFailed {
        source: AudioSource,
        message: String,
    },
    /// User stop.
    Stopped,
    /// Playback ran past the end of the media.
    Ended,
}

pub struct PlaybackEngine<C: Clock = SystemClock> {
    clock: C,
    config: EngineConfig,
    sample_rate: f32,
    state: TransportState,
    params: PlaybackParameters,
    transport: Transport,
    media: Option<LoadedMedia>,
    pending: Option<PendingLoad>,
    next_token: u64,
    progress: ProgressClock,
    events: VecDeque<EngineEvent>,
    render_ctx: RenderCtx,
}

impl<C: Clock> PlaybackEngine<C> {
    pub fn new(clock: C, config: EngineConfig, sample_rate: f32) -> Self {
        Self {
            clock,
            params: PlaybackParameters::with_gain(config.initial_gain_db),
            config,
            sample_rate,
            state: TransportState::Idle,
            transport: Transport::default(),
            media: None,
            pending: None,
            next_token: 0,
            progress: ProgressClock::new(),
            events: VecDeque::new(),
            render_ctx: RenderCtx::new(sample_rate),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // Observers --------------------------------------------------------------

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.state == TransportState::Loading
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.media.as_ref().map(|m| &m.source)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.media
            .as_ref()
            .map(|m| m.buffer.duration_seconds())
            .unwrap_or(0.0)
    }

    /// Media position in seconds, never past the end.
    pub fn position_seconds(&self) -> f64 {
        let position = self.transport.position(self.clock.now(), self.params.tempo);
        position.min(self.duration_seconds()).max(0.0)
    }

    pub fn progress(&self) -> ProgressSample {
        ProgressSample {
            position_seconds: self.position_seconds(),
            duration_seconds: self.duration_seconds(),
        }
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress().progress_percent()
    }

    pub fn parameters(&self) -> PlaybackParameters {
        self.params
    }

    pub fn current_pitch(&self) -> i32 {
        self.params.pitch_semitones
    }

    pub fn current_tempo(&self) -> f32 {
        self.params.tempo
    }

    /// Detune on the live player node, if a graph exists.
    pub fn applied_detune_cents(&self) -> Option<f32> {
        self.media.as_ref().map(|m| m.graph.player.detune())
    }

    /// Playback rate on the live player node, if a graph exists.
    pub fn applied_playback_rate(&self) -> Option<f32> {
        self.media.as_ref().map(|m| m.graph.player.playback_rate())
    }

    pub fn analysis(&self) -> Option<AnalysisSnapshot> {
        self.media.as_ref().map(|m| m.graph.snapshot())
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    // Parameters -------------------------------------------------------------

    pub fn set_pitch(&mut self, semitones: i32) -> Result<(), EngineError> {
        PITCH_RANGE.check(semitones as f64)?;
        self.apply_pitch(semitones);
        Ok(())
    }

    pub fn set_fine_tune(&mut self, cents: i32) -> Result<(), EngineError> {
        FINE_TUNE_RANGE.check(cents as f64)?;
        self.params.fine_tune_cents = cents;
        self.sync_detune();
        Ok(())
    }

    pub fn set_gain(&mut self, gain_db: f32) -> Result<(), EngineError> {
        GAIN_RANGE.check(gain_db as f64)?;
        self.params.gain_db = gain_db;
        if let Some(media) = self.media.as_mut() {
            media.graph.gain.set_gain_db(gain_db);
        }
        Ok(())
    }

    pub fn set_compressor_threshold(&mut self, threshold_db: f32) -> Result<(), EngineError> {
        THRESHOLD_RANGE.check(threshold_db as f64)?;
        self.config.compressor.threshold_db = threshold_db;
        if let Some(media) = self.media.as_mut() {
            media.graph.compressor.set_threshold_db(threshold_db);
        }
        Ok(())
    }

    pub fn set_compressor_ratio(&mut self, ratio: f32) -> Result<(), EngineError> {
        RATIO_RANGE.check(ratio as f64)?;
        self.config.compressor.ratio = ratio;
        if let Some(media) = self.media.as_mut() {
            media.graph.compressor.set_ratio(ratio);
        }
        Ok(())
    }

    // Rendering --------------------------------------------------------------

    /// Fill `out` with mono audio. Silence unless playing.
    pub fn render_block(&mut self, out: &mut [f32]) {
        let media = match self.media.as_mut() {
            Some(media) if self.state == TransportState::Playing => media,
            _ => {
                out.fill(0.0);
                return;
            }
        };
        for block in out.chunks_mut(crate::MAX_BLOCK_SIZE) {
            media.graph.render_block(block, &self.render_ctx);
            self.render_ctx = self.render_ctx.advanced(block.len());
        }
    }

    /// Stop, drop the buffer and graph, and forget any pending load.
    pub fn reset(&mut self) {
        self.progress.disarm();
        self.pending = None;
        self.media = None;
        self.transport.rewind();
        self.state = TransportState::Idle;
        log::debug!("engine reset");
    }

    fn apply_pitch(&mut self, semitones: i32) {
        self.params.pitch_semitones = semitones;
        self.sync_detune();
    }

    fn sync_detune(&mut self) {
        let cents = self.params.detune_cents() as f32;
        if let Some(media) = self.media.as_mut() {
            media.graph.player.set_detune(cents);
        }
    }

    fn apply_params(&self, graph: &mut PlayerGraph) {
        graph.player.set_detune(self.params.detune_cents() as f32);
        graph.player.set_playback_rate(self.params.tempo);
        graph.gain.set_gain_db(self.params.gain_db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DecodedBuffer;

    fn engine() -> (PlaybackEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = PlaybackEngine::new(clock.clone(), EngineConfig::default(), 48_000.0);
        (engine, clock)
    }

    fn tone(seconds: f64) -> DecodedBuffer {
        let n = (seconds * 48_000.0) as usize;
        let samples = (0..n)
            .map(|i| (std::f32::consts::TAU * 220.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect();
        DecodedBuffer::from_samples(samples, 48_000, 1)
    }

    #[test]
    fn transport_requires_media() {
        let (mut engine, _) = engine();
        assert_eq!(engine.play(), Err(EngineError::NotReady(TransportState::Idle)));
        assert_eq!(engine.seek(50.0), Err(EngineError::NotReady(TransportState::Idle)));
        assert!(engine.stop().is_err());
        assert_eq!(engine.state(), TransportState::Idle);
    }

    #[test]
    fn out_of_range_setters_change_nothing() {
        let (mut engine, _) = engine();
        engine.load_buffer("a.wav".into(), tone(1.0), 2);

        assert!(matches!(engine.set_pitch(25), Err(EngineError::OutOfRange(_))));
        assert!(matches!(engine.set_tempo(1.6), Err(EngineError::OutOfRange(_))));
        assert!(matches!(engine.set_gain(3.0), Err(EngineError::OutOfRange(_))));
        assert!(matches!(engine.set_fine_tune(-101), Err(EngineError::OutOfRange(_))));
        assert!(matches!(engine.seek(100.5), Err(EngineError::OutOfRange(_))));

        assert_eq!(engine.current_pitch(), 2);
        assert_eq!(engine.current_tempo(), 1.0);
        assert_eq!(engine.applied_detune_cents(), Some(200.0));
    }

    #[test]
    fn detune_includes_fine_tune() {
        let (mut engine, _) = engine();
        engine.load_buffer("a.wav".into(), tone(1.0), -3);
        engine.set_fine_tune(40).unwrap();
        assert_eq!(engine.applied_detune_cents(), Some(-260.0));
    }

    #[test]
    fn render_is_silent_unless_playing() {
        let (mut engine, _) = engine();
        engine.load_buffer("a.wav".into(), tone(1.0), 0);

        let mut out = vec![1.0; 1024];
        engine.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        engine.play().unwrap();
        engine.render_block(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn analysis_follows_playback() {
        let (mut engine, _) = engine();
        assert!(engine.analysis().is_none());

        engine.load_buffer("a.wav".into(), tone(1.0), 0);
        engine.play().unwrap();
        let mut out = vec![0.0; 512];
        engine.render_block(&mut out);

        let snapshot = engine.analysis().unwrap();
        assert_eq!(snapshot.waveform.len(), 256);
        assert_eq!(snapshot.spectrum_db.len(), 128);
    }

    #[test]
    fn reset_drops_everything() {
        let (mut engine, _) = engine();
        engine.load_buffer("a.wav".into(), tone(1.0), 0);
        engine.play().unwrap();
        engine.reset();

        assert_eq!(engine.state(), TransportState::Idle);
        assert!(engine.source().is_none());
        assert!(engine.next_tick().is_none());
        assert!(engine.buffer().is_none());
    }

    #[test]
    fn compressor_settings_survive_reload() {
        let (mut engine, _) = engine();
        engine.set_compressor_threshold(-12.0).unwrap();
        engine.set_compressor_ratio(2.0).unwrap();
        engine.load_buffer("a.wav".into(), tone(1.0), 0);
        assert_eq!(engine.config().compressor.threshold_db, -12.0);
        assert!(engine.set_compressor_ratio(0.5).is_err());
    }
}
