use std::path::PathBuf;

use thiserror::Error;

use crate::engine::TransportState;
use crate::harmonic::SongId;

/// The audio source could not be reached.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// The fetched bytes are not decodable audio.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid wav data: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio contains no samples")]
    Empty,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// A parameter value outside its declared bounds.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{param} {value} outside {min}..={max}")]
pub struct RangeError {
    pub param: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no audio loaded (transport is {0:?})")]
    NotReady(TransportState),

    #[error("nothing is playing (transport is {0:?})")]
    NotPlaying(TransportState),

    #[error(transparent)]
    OutOfRange(#[from] RangeError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("unknown song {0}")]
    UnknownSong(SongId),

    #[error("song store rejected update: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error(transparent)]
    OutOfRange(#[from] RangeError),

    #[error("pitch {pitch:+} puts the top note at {note}, above the safe ceiling {ceiling}")]
    SafePitchExceeded {
        pitch: i32,
        note: String,
        ceiling: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("unknown song {0}")]
    UnknownSong(SongId),

    #[error("song {0} has no audio source")]
    NoAudio(SongId),

    #[error("no song loaded")]
    NoSong,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[cfg(feature = "serde")]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    OutOfRange(#[from] RangeError),
}
