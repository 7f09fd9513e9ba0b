/*
Dynamic Range Compressor
========================

A compressor turns loud passages down so the quiet ones can sit closer to
them. Transposing a recording changes where its energy sits, so the player
keeps a gentle compressor at the end of the chain to hold the output level
steady.

Parameters
----------

  threshold (dB)   Level above which gain reduction starts. Default -24 dB.

  ratio            How hard signal above the threshold is squashed.
                   4:1 means 4 dB over the threshold comes out as 1 dB over.

  attack (s)       How quickly the detector follows a rising level (3 ms).

  release (s)      How quickly it lets go once the level falls (250 ms).


Signal Flow
-----------

    input ──┬──────────────────────────────► × ──► output
            │                                ▲
            └─► |x| ─► envelope ─► dB ─► gain computer
                      (attack /
                       release)

The detector is a peak follower with separate one-pole coefficients for
rising and falling input:

    coeff = exp(-1 / (time × sample_rate))
    env   = coeff × env + (1 - coeff) × |x|

Gain computer (hard knee):

    over      = max(0, level_db - threshold)
    reduction = over × (1 - 1 / ratio)
    gain      = 10 ^ (-reduction / 20)

Ratio 1 never reduces anything, so the compressor is transparent.
*/

use crate::dsp::amplify::{db_to_gain, gain_to_db};

pub const DEFAULT_THRESHOLD_DB: f32 = -24.0;
pub const DEFAULT_RATIO: f32 = 4.0;
pub const DEFAULT_ATTACK: f32 = 0.003;
pub const DEFAULT_RELEASE: f32 = 0.25;

#[derive(Clone, Copy, Debug)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack: f32,
    release: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(threshold_db: f32, ratio: f32, attack: f32, release: f32, sample_rate: f32) -> Self {
        let mut compressor = Self {
            threshold_db,
            ratio: ratio.max(1.0),
            attack,
            release,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
        };
        compressor.set_sample_rate(sample_rate);
        compressor
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.attack_coeff = time_coeff(self.attack, sample_rate);
        self.release_coeff = time_coeff(self.release, sample_rate);
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db;
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Ratios below 1 would expand; they are treated as 1.
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.max(1.0);
    }

    /// Current detector level in dB.
    pub fn envelope_db(&self) -> f32 {
        gain_to_db(self.envelope)
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Gain reduction in dB for a detector level.
    #[inline]
    pub fn reduction_db(&self, level_db: f32) -> f32 {
        let over = (level_db - self.threshold_db).max(0.0);
        over * (1.0 - 1.0 / self.ratio)
    }

    /// Compress `signal` in place.
    pub fn process(&mut self, signal: &mut [f32]) {
        for sample in signal.iter_mut() {
            let level = sample.abs();
            let coeff = if level > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * level;

            let reduction = self.reduction_db(gain_to_db(self.envelope));
            if reduction > 0.0 {
                *sample *= db_to_gain(-reduction);
            }
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(
            DEFAULT_THRESHOLD_DB,
            DEFAULT_RATIO,
            DEFAULT_ATTACK,
            DEFAULT_RELEASE,
            48_000.0,
        )
    }
}

#[inline]
fn time_coeff(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 || sample_rate <= 0.0 {
        return 0.0;
    }
    (-1.0 / (seconds * sample_rate)).exp()
}
