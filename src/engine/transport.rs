use crate::{
    engine::{
        clock::Clock,
        params::{SEEK_RANGE, TEMPO_RANGE},
        scheduler::{ProgressSample, TickOutcome, TickToken},
        EngineEvent, PlaybackEngine,
    },
    error::EngineError,
};

/*
Transport
=========

    Idle ──load──► Loading ──ok──► Ready ──play──► Playing ⇄ Paused
      ▲               │              ▲                │         │
      └────failed─────┘              └──stop / end────┴─────────┘

Position Bookkeeping
--------------------

Position is measured on the engine clock, not by counting rendered samples:

    position = offset + (now - started_at) × tempo      while playing
    position = offset                                    otherwise

Whenever the interval since `started_at` closes (pause, stop, or a tempo
change) its elapsed time is folded into `offset` at the tempo that was in
effect while it ran, and a new interval opens. Already-accumulated time is
never rescaled.

    play at t=0, tempo 1.0        offset 0
    set_tempo(0.5) at t=4         offset 4,   started_at 4
    pause at t=6                  offset 5    (4 + 2 × 0.5)
*/

/// Where playback is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
}

impl TransportState {
    /// A decoded buffer is present.
    pub fn has_media(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }
}

/// Accumulated offset plus the start of the open interval, all in seconds.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Transport {
    offset: f64,
    started_at: Option<f64>,
}

impl Transport {
    pub(crate) fn position(&self, now: f64, tempo: f32) -> f64 {
        let running = self
            .started_at
            .map(|start| (now - start).max(0.0) * tempo as f64)
            .unwrap_or(0.0);
        self.offset + running
    }

    pub(crate) fn start(&mut self, now: f64) {
        self.started_at = Some(now);
    }

    /// Close the open interval at `tempo` and open a new one.
    pub(crate) fn fold(&mut self, now: f64, tempo: f32) {
        if self.started_at.is_some() {
            self.offset = self.position(now, tempo);
            self.started_at = Some(now);
        }
    }

    pub(crate) fn halt(&mut self, now: f64, tempo: f32) {
        self.offset = self.position(now, tempo);
        self.started_at = None;
    }

    pub(crate) fn rewind(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn jump(&mut self, offset: f64, now: f64) {
        self.offset = offset;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }
}

impl<C: Clock> PlaybackEngine<C> {
    /// Valid from `Ready` and `Paused`. Playing again is a no-op.
    pub fn play(&mut self) -> Result<(), EngineError> {
        match self.state {
            TransportState::Playing => return Ok(()),
            TransportState::Ready | TransportState::Paused => {}
            state => return Err(EngineError::NotReady(state)),
        }
        let Some(media) = self.media.as_mut() else {
            return Err(EngineError::NotReady(self.state));
        };

        let offset = self.transport.position(self.clock.now(), self.params.tempo);
        media.graph.player.start(offset);
        self.transport.start(self.clock.now());
        self.progress.arm();
        self.state = TransportState::Playing;
        log::debug!("play from {offset:.3}s");
        Ok(())
    }

    /// Valid from `Playing`. Pausing twice is a no-op; pausing media that
    /// never started is `NotPlaying`.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        match self.state {
            TransportState::Playing => {}
            TransportState::Paused => return Ok(()),
            TransportState::Ready => return Err(EngineError::NotPlaying(TransportState::Ready)),
            state => return Err(EngineError::NotReady(state)),
        }

        self.transport.halt(self.clock.now(), self.params.tempo);
        if let Some(media) = self.media.as_mut() {
            media.graph.player.stop();
        }
        self.progress.disarm();
        self.state = TransportState::Paused;
        log::debug!("paused at {:.3}s", self.position_seconds());
        Ok(())
    }

    /// Back to zero and `Ready`.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if !self.state.has_media() {
            return Err(EngineError::NotReady(self.state));
        }
        self.halt_to_start();
        self.events.push_back(EngineEvent::Stopped);
        log::debug!("stopped");
        Ok(())
    }

    pub fn toggle_playback(&mut self) -> Result<(), EngineError> {
        if self.state == TransportState::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Jump to `percent` (0..=100) of the media. Transport state is kept.
    pub fn seek(&mut self, percent: f64) -> Result<(), EngineError> {
        SEEK_RANGE.check(percent)?;
        let Some(media) = self.media.as_mut() else {
            return Err(EngineError::NotReady(self.state));
        };

        let position = media.buffer.duration_seconds() * percent / 100.0;
        self.transport.jump(position, self.clock.now());
        if self.state == TransportState::Playing {
            media.graph.player.start(position);
        }
        log::debug!("seek to {position:.3}s ({percent:.1}%)");
        Ok(())
    }

    pub fn set_tempo(&mut self, tempo: f32) -> Result<(), EngineError> {
        TEMPO_RANGE.check(tempo as f64)?;
        self.transport.fold(self.clock.now(), self.params.tempo);
        self.params.tempo = tempo;
        if let Some(media) = self.media.as_mut() {
            media.graph.player.set_playback_rate(tempo);
        }
        Ok(())
    }

    /// Advance the progress loop with a token from [`ProgressClock::next_tick`].
    ///
    /// [`ProgressClock::next_tick`]: crate::engine::scheduler::ProgressClock::next_tick
    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if self.state != TransportState::Playing || !self.progress.accept(token) {
            return TickOutcome::Stale;
        }

        let duration = self.duration_seconds();
        let position = self.transport.position(self.clock.now(), self.params.tempo);
        if position >= duration {
            self.halt_to_start();
            self.events.push_back(EngineEvent::Ended);
            log::info!("reached end of media ({duration:.3}s)");
            return TickOutcome::Ended;
        }

        TickOutcome::Progress(ProgressSample {
            position_seconds: position,
            duration_seconds: duration,
        })
    }

    /// Run the pending tick, if the clock is armed.
    pub fn poll(&mut self) -> Option<TickOutcome> {
        let token = self.progress.next_tick()?;
        Some(self.tick(token))
    }

    pub fn next_tick(&self) -> Option<TickToken> {
        self.progress.next_tick()
    }

    fn halt_to_start(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.graph.player.stop();
        }
        self.progress.disarm();
        self.transport.rewind();
        self.state = TransportState::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_keeps_earlier_intervals_at_their_tempo() {
        let mut transport = Transport::default();
        transport.start(0.0);
        transport.fold(4.0, 1.0);
        transport.halt(6.0, 0.5);
        assert_eq!(transport.position(100.0, 2.0), 5.0);
    }

    #[test]
    fn jump_restarts_the_open_interval() {
        let mut transport = Transport::default();
        transport.start(0.0);
        transport.jump(30.0, 10.0);
        assert_eq!(transport.position(12.0, 1.0), 32.0);
    }

    #[test]
    fn stopped_transport_does_not_move() {
        let mut transport = Transport::default();
        transport.jump(3.0, 5.0);
        assert_eq!(transport.position(50.0, 1.0), 3.0);
    }
}
