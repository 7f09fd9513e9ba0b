#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Closed bounds for one user-facing parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(name: &'static str, min: f64, max: f64) -> Self {
        Self { name, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// `Ok` inside the bounds. NaN is always out of range.
    pub fn check(&self, value: f64) -> Result<(), RangeError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(RangeError {
                param: self.name,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const PITCH_RANGE: ParamRange = ParamRange::new("pitch", -24.0, 24.0);
pub const FINE_TUNE_RANGE: ParamRange = ParamRange::new("fine_tune", -100.0, 100.0);
pub const TEMPO_RANGE: ParamRange = ParamRange::new("tempo", 0.5, 1.5);
pub const GAIN_RANGE: ParamRange = ParamRange::new("gain_db", -60.0, 0.0);
pub const SEEK_RANGE: ParamRange = ParamRange::new("seek_percent", 0.0, 100.0);
pub const THRESHOLD_RANGE: ParamRange = ParamRange::new("compressor_threshold_db", -100.0, 0.0);
pub const RATIO_RANGE: ParamRange = ParamRange::new("compressor_ratio", 1.0, 20.0);

/// Values the engine applies to the player graph.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaybackParameters {
    pub pitch_semitones: i32,
    pub fine_tune_cents: i32,
    pub tempo: f32,
    pub gain_db: f32,
}

impl PlaybackParameters {
    pub fn with_gain(gain_db: f32) -> Self {
        Self {
            gain_db,
            ..Self::default()
        }
    }

    /// Detune applied to the player: `pitch * 100 + fine_tune`.
    pub fn detune_cents(&self) -> i32 {
        self.pitch_semitones * 100 + self.fine_tune_cents
    }
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self {
            pitch_semitones: 0,
            fine_tune_cents: 0,
            tempo: 1.0,
            gain_db: -6.0,
        }
    }
}
