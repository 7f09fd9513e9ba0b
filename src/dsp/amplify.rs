//! Gain and decibel conversion primitives.

/*
Gain in Decibels
================

Playback volume is set in decibels (dB) because human hearing is
logarithmic - we perceive loudness ratios, not differences.

    amplitude_ratio = 10 ^ (dB / 20)
    dB              = 20 × log₁₀(amplitude_ratio)

Common reference points:
    ×1.0   =   0 dB  (unity, no change)
    ×0.5   =  -6 dB  (half amplitude, the default playback level)
    ×0.1   = -20 dB  (one-tenth amplitude, much quieter)
    ×0.001 = -60 dB  (the bottom of the volume slider, effectively silent)

Every halving of amplitude ≈ -6 dB.


Implementation Notes
--------------------

Gain is stateless: each output sample is the input sample times a constant.
The conversion from dB happens once when the parameter changes, never per
sample.
*/

/// Smallest linear level reported by [`gain_to_db`], avoids `log10(0)`.
pub const SILENCE: f32 = 1.0e-6;

/// Convert decibels to a linear amplitude factor.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.abs().max(SILENCE).log10()
}

/// Multiply a signal by a constant gain factor (in-place).
#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// Peak absolute level of a block.
#[inline]
pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
}
