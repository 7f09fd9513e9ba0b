/*
Progress Clock
==============

While audio plays, the host wants a steady stream of "where are we" samples
for its progress bar, and it needs to learn exactly once that the media
ran out. The progress clock is the bookkeeping half of that loop: the engine
arms it on play, disarms it on pause, stop, reset and load, and the host
drives it once per frame.

    host frame ─► next_tick() ─► Some(token) ─► engine.tick(token)
                       │                              │
                       └─► None (disarmed)            ├─► Progress(sample)
                                                      ├─► Ended
                                                      └─► Stale

Tokens
------

Every accepted tick rearms with a fresh token. A disarm throws the current
token away, so a token captured before pause/stop/reset can never advance
the clock again, even after a later re-arm. This is what keeps a late
callback from a previous playback from emitting progress or a second end.
*/

/// Identifies one scheduled progress tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// Position snapshot published while playing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressSample {
    pub position_seconds: f64,
    pub duration_seconds: f64,
}

impl ProgressSample {
    /// 0..=100, or 0 for empty media.
    pub fn progress_percent(&self) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        (self.position_seconds / self.duration_seconds * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// The token was disarmed or already consumed.
    Stale,
    Progress(ProgressSample),
    /// Playback reached the end of the media; reported once.
    Ended,
}

#[derive(Debug, Default)]
pub struct ProgressClock {
    armed: Option<TickToken>,
    next_id: u64,
}

impl ProgressClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the first tick. Re-arming replaces any pending token.
    pub fn arm(&mut self) -> TickToken {
        let token = TickToken(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.armed = Some(token);
        token
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Token the host should hand back on its next frame.
    pub fn next_tick(&self) -> Option<TickToken> {
        self.armed
    }

    /// Consume `token`. On success the clock is rearmed with a new token.
    pub fn accept(&mut self, token: TickToken) -> bool {
        if self.armed != Some(token) {
            return false;
        }
        self.arm();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_rotate_on_every_tick() {
        let mut clock = ProgressClock::new();
        let first = clock.arm();
        assert!(clock.accept(first));

        let second = clock.next_tick().unwrap();
        assert_ne!(first, second);
        assert!(!clock.accept(first));
        assert!(clock.accept(second));
    }

    #[test]
    fn disarm_invalidates_captured_tokens() {
        let mut clock = ProgressClock::new();
        let token = clock.arm();
        clock.disarm();
        assert_eq!(clock.next_tick(), None);
        assert!(!clock.accept(token));

        clock.arm();
        assert!(!clock.accept(token));
    }

    #[test]
    fn percent_is_derived() {
        let sample = ProgressSample {
            position_seconds: 2.5,
            duration_seconds: 10.0,
        };
        assert_eq!(sample.progress_percent(), 25.0);
        assert_eq!(ProgressSample::default().progress_percent(), 0.0);
    }
}
