//! Tunable defaults for the engine and the harmonic sync policy.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! [engine]
//! initial_gain_db = -9.0
//!
//! [engine.grain]
//! grain_size = 0.12
//!
//! [sync]
//! prevent_stage_key_overwrite = true
//! key_preference = "flats"
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{analysis::DEFAULT_ANALYSER_SIZE, compressor},
    engine::params::GAIN_RANGE,
    error::{ConfigError, RangeError},
    harmonic::SyncPolicy,
};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GrainConfig {
    /// Seconds between grain launches.
    pub grain_size: f32,
    /// Seconds of crossfade between neighbouring grains.
    pub overlap: f32,
}

impl Default for GrainConfig {
    fn default() -> Self {
        Self {
            grain_size: 0.18,
            overlap: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompressorConfig {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack: f32,
    pub release: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold_db: compressor::DEFAULT_THRESHOLD_DB,
            ratio: compressor::DEFAULT_RATIO,
            attack: compressor::DEFAULT_ATTACK,
            release: compressor::DEFAULT_RELEASE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub initial_gain_db: f32,
    pub grain: GrainConfig,
    pub compressor: CompressorConfig,
    pub analyser_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_gain_db: -6.0,
            grain: GrainConfig::default(),
            compressor: CompressorConfig::default(),
            analyser_size: DEFAULT_ANALYSER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), RangeError> {
        GAIN_RANGE.check(self.initial_gain_db as f64)?;
        check("grain_size", self.grain.grain_size as f64, 0.01, 1.0)?;
        check("overlap", self.grain.overlap as f64, 0.0, self.grain.grain_size as f64)?;
        check("compressor.threshold_db", self.compressor.threshold_db as f64, -100.0, 0.0)?;
        check("compressor.ratio", self.compressor.ratio as f64, 1.0, 20.0)?;
        check("compressor.attack", self.compressor.attack as f64, 0.0, 1.0)?;
        check("compressor.release", self.compressor.release as f64, 0.0, 1.0)?;
        check("analyser_size", self.analyser_size as f64, 32.0, 32_768.0)?;
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StudioConfig {
    pub engine: EngineConfig,
    pub sync: SyncPolicy,
}

impl StudioConfig {
    #[cfg(feature = "serde")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        Ok(())
    }
}

fn check(param: &'static str, value: f64, min: f64, max: f64) -> Result<(), RangeError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RangeError {
            param,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPreference;

    #[test]
    fn defaults_match_the_player() {
        let config = StudioConfig::default();
        assert_eq!(config.engine.initial_gain_db, -6.0);
        assert_eq!(config.engine.grain.grain_size, 0.18);
        assert_eq!(config.engine.compressor.ratio, 4.0);
        assert_eq!(config.engine.analyser_size, 256);
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StudioConfig::from_toml_str(
            r#"
            [engine]
            initial_gain_db = -9.0

            [engine.grain]
            grain_size = 0.12

            [sync]
            prevent_stage_key_overwrite = true
            key_preference = "flats"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.initial_gain_db, -9.0);
        assert_eq!(config.engine.grain.grain_size, 0.12);
        assert_eq!(config.engine.grain.overlap, 0.1);
        assert!(config.sync.prevent_stage_key_overwrite);
        assert_eq!(config.sync.key_preference, KeyPreference::Flats);
        assert_eq!(config.sync.safe_pitch.max_note, "G3");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn out_of_range_values_are_rejected() {
        let err = StudioConfig::from_toml_str("[engine]\ninitial_gain_db = 6.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange(RangeError { param: "gain_db", .. })));

        let err = StudioConfig::from_toml_str("[engine.grain]\noverlap = 0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange(RangeError { param: "overlap", .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            StudioConfig::from_toml_str("engine = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
