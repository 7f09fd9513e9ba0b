//! Pitched notes with an octave ("G3", "C#5"), used for vocal-range checks.

use std::cmp::Ordering;
use std::fmt;

use super::{KeyPreference, Root};

const MIN_OCTAVE: i32 = 0;
const MAX_OCTAVE: i32 = 8;

/// A note name plus octave in 0..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    root: Root,
    octave: u8,
}

impl Note {
    /// Parse `^[A-G][#b]?[0-8]$`. Anything else is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let split = input.len().checked_sub(1)?;
        if !input.is_char_boundary(split) {
            return None;
        }
        let (name, octave) = input.split_at(split);
        let octave = octave.parse::<u8>().ok()?;
        if octave as i32 > MAX_OCTAVE {
            return None;
        }
        Some(Self {
            root: Root::parse(name)?,
            octave,
        })
    }

    pub fn root(&self) -> Root {
        self.root
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// Absolute semitone number, octave-major (C0 = 0).
    pub fn semitone(&self) -> i32 {
        self.octave as i32 * 12 + self.root.pitch_class() as i32
    }

    /// Shift by `semitones`. The octave follows the total and is clamped to
    /// 0..=8.
    pub fn transposed(self, semitones: i32, preference: KeyPreference) -> Self {
        let total = (self.root.pitch_class() as i32).saturating_add(semitones);
        let pitch_class = total.rem_euclid(12) as u8;
        let octave = (self.octave as i32 + total.div_euclid(12)).clamp(MIN_OCTAVE, MAX_OCTAVE);
        Self {
            root: Root::from_pitch_class(pitch_class, preference),
            octave: octave as u8,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root.name(), self.octave)
    }
}

/// Transpose a note string such as "G3". Unparseable input is returned
/// unchanged, empty input stays empty.
pub fn transpose_note(note: &str, semitones: i32, preference: KeyPreference) -> String {
    match Note::parse(note) {
        Some(parsed) => parsed.transposed(semitones, preference).to_string(),
        None => note.to_string(),
    }
}

/// Order two note strings by pitch. Unparseable notes compare as C4.
pub fn compare_notes(a: &str, b: &str) -> Ordering {
    let fallback = Note {
        root: Root::from_pitch_class(0, KeyPreference::Sharps),
        octave: 4,
    };
    let a = Note::parse(a).unwrap_or(fallback);
    let b = Note::parse(b).unwrap_or(fallback);
    a.semitone().cmp(&b.semitone())
}
