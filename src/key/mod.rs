//! Musical key calculus: normalisation, notation and semitone arithmetic.
//!
//! Everything here is pure and allocation-light. Malformed input never
//! panics; it degrades to [`Key::Tbc`], which every operation treats as
//! "no known key".

pub mod note;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use note::{compare_notes, transpose_note, Note};

/*
Keys, Roots and Pitch Classes
=============================

Western music divides the octave into 12 equally spaced semitones. Each of
the 12 positions is a "pitch class"; the key of a song is named after the
pitch class of its tonic plus a mode (major or minor).

Vocabulary
----------

  pitch class   One of the 12 semitone positions, numbered 0..11 from C:

                  C  C# D  D# E  F  F# G  G# A  A# B
                  0  1  2  3  4  5  6  7  8  9  10 11

  root          The spelled name of a pitch class. The five black keys have
                two spellings (C# = Db, D# = Eb, F# = Gb, G# = Ab, A# = Bb);
                the naturals have one.

  TBC           "To be confirmed". The sentinel for a song whose key is not
                known. It absorbs every operation: TBC + 3 semitones = TBC.


Semitone Distance
-----------------

The distance between two keys is the shortest signed walk around the circle
of 12 pitch classes:

    diff = target - original            (in -11..=11)
    if diff >  6 { diff -= 12 }
    if diff < -6 { diff += 12 }

Exactly +6 and -6 are left alone, so a tritone up from C reads +6 while a
tritone up from G (to C#) reads -6. Stored arrangements depend on this rule,
so it is kept as is.
*/

/// Roots in sharp spelling, indexed by pitch class.
pub const SHARP_KEYS: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Roots in flat spelling, indexed by pitch class.
pub const FLAT_KEYS: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Notation used when a pitch class has two spellings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPreference {
    #[default]
    Sharps,
    Flats,
    /// No preference; rendered as sharps.
    Neutral,
}

impl KeyPreference {
    fn table(self) -> &'static [&'static str; 12] {
        match self {
            KeyPreference::Flats => &FLAT_KEYS,
            KeyPreference::Sharps | KeyPreference::Neutral => &SHARP_KEYS,
        }
    }
}

/// A spelled key root ("C", "F#", "Bb").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Root {
    name: &'static str,
    pitch_class: u8,
}

impl Root {
    /// Look up a root by its exact spelling. Only the 17 spellings in
    /// [`SHARP_KEYS`] and [`FLAT_KEYS`] are accepted.
    pub fn parse(name: &str) -> Option<Self> {
        SHARP_KEYS
            .iter()
            .chain(FLAT_KEYS.iter())
            .position(|&k| k == name)
            .map(|i| {
                let pitch_class = (i % 12) as u8;
                let table = if i < 12 { &SHARP_KEYS } else { &FLAT_KEYS };
                Root {
                    name: table[pitch_class as usize],
                    pitch_class,
                }
            })
    }

    pub fn from_pitch_class(pitch_class: u8, preference: KeyPreference) -> Self {
        let pitch_class = pitch_class % 12;
        Root {
            name: preference.table()[pitch_class as usize],
            pitch_class,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    /// Same pitch class, spelled according to `preference`.
    pub fn respelled(self, preference: KeyPreference) -> Self {
        Self::from_pitch_class(self.pitch_class, preference)
    }
}

/// A normalised musical key, or the "TBC" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Key {
    #[default]
    Tbc,
    Known { root: Root, minor: bool },
}

impl Key {
    pub const TBC: &'static str = "TBC";

    pub fn is_tbc(&self) -> bool {
        matches!(self, Key::Tbc)
    }

    pub fn root(&self) -> Option<Root> {
        match self {
            Key::Tbc => None,
            Key::Known { root, .. } => Some(*root),
        }
    }

    pub fn is_minor(&self) -> bool {
        matches!(self, Key::Known { minor: true, .. })
    }

    pub fn pitch_class(&self) -> Option<u8> {
        self.root().map(|r| r.pitch_class())
    }

    /// Same key, root spelled according to `preference`.
    pub fn respelled(self, preference: KeyPreference) -> Self {
        match self {
            Key::Tbc => Key::Tbc,
            Key::Known { root, minor } => Key::Known {
                root: root.respelled(preference),
                minor,
            },
        }
    }

    /// Shift by `semitones`, wrapping modulo 12 and keeping the mode.
    pub fn transposed(self, semitones: i32, preference: KeyPreference) -> Self {
        match self {
            Key::Tbc => Key::Tbc,
            Key::Known { root, minor } => {
                let pc = (root.pitch_class() as i32 + semitones.rem_euclid(12)).rem_euclid(12) as u8;
                Key::Known {
                    root: Root::from_pitch_class(pc, preference),
                    minor,
                }
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Tbc => f.write_str(Key::TBC),
            Key::Known { root, minor } => {
                f.write_str(root.name())?;
                if *minor {
                    f.write_str("m")?;
                }
                Ok(())
            }
        }
    }
}

/// Normalise any key string to its shorthand: "D Major" → "D",
/// "c# minor" → "C#m", "db" → "Db". Empty input, input starting with a digit
/// and anything unrecognisable become [`Key::Tbc`].
pub fn normalize_key(input: &str) -> Key {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Key::Tbc;
    }

    let lowered = trimmed.to_lowercase();
    let first_word = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let shorthand = if lowered.contains("minor") {
        format!("{first_word}m")
    } else if lowered.contains("major") {
        first_word.to_string()
    } else {
        trimmed.to_string()
    };

    // First letter upper, the rest lower.
    let mut chars = shorthand.chars();
    let canonical: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => return Key::Tbc,
    };

    let (root_name, minor) = match canonical.strip_suffix('m') {
        Some(root) => (root, true),
        None => (canonical.as_str(), false),
    };

    match Root::parse(root_name) {
        Some(root) => Key::Known { root, minor },
        None => Key::Tbc,
    }
}

/// Render `key` in the requested notation. "TBC" passes through.
pub fn format_key(key: &str, preference: KeyPreference) -> String {
    normalize_key(key).respelled(preference).to_string()
}

/// Index of a root in the sharp ordering, accepting either spelling.
pub fn semitone_index(root: &str) -> Option<u8> {
    Root::parse(root).map(|r| r.pitch_class())
}

/// Signed semitone distance from `original` to `target`, wrapped into
/// [-6, 6]. Mode is ignored; 0 when either side is TBC.
pub fn calculate_semitones(original: &str, target: &str) -> i32 {
    let (Some(from), Some(to)) = (
        normalize_key(original).pitch_class(),
        normalize_key(target).pitch_class(),
    ) else {
        return 0;
    };

    let mut diff = to as i32 - from as i32;
    if diff > 6 {
        diff -= 12;
    }
    if diff < -6 {
        diff += 12;
    }
    diff
}

/// Transpose `key` by `semitones`, spelled with sharps.
pub fn transpose_key(key: &str, semitones: i32) -> Key {
    transpose_key_with(key, semitones, KeyPreference::Sharps)
}

pub fn transpose_key_with(key: &str, semitones: i32, preference: KeyPreference) -> Key {
    normalize_key(key).transposed(semitones, preference)
}

/// All 24 major and minor key names in the given notation, majors first.
pub fn all_keys(preference: KeyPreference) -> Vec<String> {
    let table = preference.table();
    table
        .iter()
        .map(|k| k.to_string())
        .chain(table.iter().map(|k| format!("{k}m")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_suffixes_and_case() {
        assert_eq!(normalize_key("D Major").to_string(), "D");
        assert_eq!(normalize_key("C Minor").to_string(), "Cm");
        assert_eq!(normalize_key("  db ").to_string(), "Db");
        assert_eq!(normalize_key("f#m").to_string(), "F#m");
        assert_eq!(normalize_key("bb minor").to_string(), "Bbm");
    }

    #[test]
    fn malformed_keys_become_tbc() {
        for input in ["", "   ", "12", "7th", "H", "C##", "E#", "Cmaj7", "TBC", "hello"] {
            assert_eq!(normalize_key(input), Key::Tbc, "input {input:?}");
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["d major", "c# MINOR", "eb", "Bbm", "TBC", "G", "xyz"] {
            let once = normalize_key(input);
            let twice = normalize_key(&once.to_string());
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn format_swaps_only_black_keys() {
        assert_eq!(format_key("C#", KeyPreference::Flats), "Db");
        assert_eq!(format_key("Ebm", KeyPreference::Sharps), "D#m");
        assert_eq!(format_key("G", KeyPreference::Flats), "G");
        assert_eq!(format_key("Bb", KeyPreference::Neutral), "A#");
        assert_eq!(format_key("TBC", KeyPreference::Flats), "TBC");
    }

    #[test]
    fn semitone_index_accepts_both_spellings() {
        assert_eq!(semitone_index("C"), Some(0));
        assert_eq!(semitone_index("C#"), Some(1));
        assert_eq!(semitone_index("Db"), Some(1));
        assert_eq!(semitone_index("B"), Some(11));
        assert_eq!(semitone_index("Cb"), None);
    }

    #[test]
    fn semitone_distance_takes_shortest_path() {
        assert_eq!(calculate_semitones("C", "Eb"), 3);
        assert_eq!(calculate_semitones("C", "A"), -3);
        assert_eq!(calculate_semitones("A", "C"), 3);
        assert_eq!(calculate_semitones("Am", "Cm"), 3);
        assert_eq!(calculate_semitones("B", "C"), 1);
    }

    #[test]
    fn tritone_keeps_its_sign() {
        // C → F#: raw diff +6 stays +6
        assert_eq!(calculate_semitones("C", "F#"), 6);
        // G → C#: raw diff -6 stays -6
        assert_eq!(calculate_semitones("G", "C#"), -6);
        // F# → C: raw diff -6 stays -6
        assert_eq!(calculate_semitones("F#", "C"), -6);
    }

    #[test]
    fn tbc_absorbs_everything() {
        assert_eq!(calculate_semitones("TBC", "C"), 0);
        assert_eq!(calculate_semitones("C", ""), 0);
        for n in -24..=24 {
            assert_eq!(transpose_key("TBC", n), Key::Tbc);
        }
    }

    #[test]
    fn transpose_wraps_and_keeps_mode() {
        assert_eq!(transpose_key("C", 3).to_string(), "D#");
        assert_eq!(transpose_key("A", 5).to_string(), "D");
        assert_eq!(transpose_key("Bm", 1).to_string(), "Cm");
        assert_eq!(transpose_key("C", -1).to_string(), "B");
        assert_eq!(transpose_key("C", 24).to_string(), "C");
        assert_eq!(
            transpose_key_with("C", 3, KeyPreference::Flats).to_string(),
            "Eb"
        );
    }

    #[test]
    fn lists_all_keys() {
        let keys = all_keys(KeyPreference::Flats);
        assert_eq!(keys.len(), 24);
        assert_eq!(keys[1], "Db");
        assert_eq!(keys[13], "Dbm");
    }
}
