use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Identifier of a piece of audio: a URL or a local path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AudioSource(String);

impl AudioSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL scheme, if the source has one ("file", "https").
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once("://")?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
            return None;
        }
        Some(scheme)
    }

    /// Local filesystem path for `file://` URLs and plain paths.
    pub fn local_path(&self) -> Option<PathBuf> {
        match self.scheme() {
            Some(scheme) if scheme.eq_ignore_ascii_case("file") => {
                self.0.split_once("://").map(|(_, path)| PathBuf::from(path))
            }
            Some(_) => None,
            None => Some(PathBuf::from(&self.0)),
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AudioSource {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for AudioSource {
    fn from(source: String) -> Self {
        Self(source)
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// Turns an [`AudioSource`] into encoded bytes.
///
/// This is the only blocking I/O in the crate. Hosts run it wherever they
/// like (the player binary uses a worker thread).
pub trait SourceFetcher {
    fn fetch(&self, source: &AudioSource) -> Result<Vec<u8>, FetchError>;
}

impl<F> SourceFetcher for F
where
    F: Fn(&AudioSource) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, source: &AudioSource) -> Result<Vec<u8>, FetchError> {
        self(source)
    }
}

/// Reads local files. Remote schemes are refused.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl SourceFetcher for FileFetcher {
    fn fetch(&self, source: &AudioSource) -> Result<Vec<u8>, FetchError> {
        let path = source
            .local_path()
            .ok_or_else(|| FetchError::UnsupportedScheme(source.scheme().unwrap_or_default().to_string()))?;
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}
