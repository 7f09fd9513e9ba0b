#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::SyncError,
    key::{compare_notes, transpose_note, KeyPreference, Note},
};

/// Singer-range guard: refuse transpositions that push the song's highest
/// note above `max_note`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SafePitchPolicy {
    pub enabled: bool,
    pub max_note: String,
}

impl Default for SafePitchPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_note: "G3".to_string(),
        }
    }
}

impl SafePitchPolicy {
    pub fn enabled(max_note: &str) -> Self {
        Self {
            enabled: true,
            max_note: max_note.to_string(),
        }
    }

    /// Check a move from `current` to `requested`. Only increases are
    /// guarded, and only for songs with a parseable highest note.
    pub fn check(
        &self,
        highest_note: Option<&str>,
        current: i32,
        requested: i32,
        preference: KeyPreference,
    ) -> Result<(), SyncError> {
        if !self.enabled || requested <= current {
            return Ok(());
        }
        let Some(highest) = highest_note.filter(|n| Note::parse(n).is_some()) else {
            return Ok(());
        };

        let transposed = transpose_note(highest, requested, preference);
        if compare_notes(&transposed, &self.max_note).is_gt() {
            log::warn!(
                "pitch {requested:+} rejected: top note {transposed} above safe ceiling {}",
                self.max_note
            );
            return Err(SyncError::SafePitchExceeded {
                pitch: requested,
                note: transposed,
                ceiling: self.max_note.clone(),
            });
        }
        Ok(())
    }

    /// Largest pitch that keeps `highest_note` at or below the ceiling.
    pub fn max_pitch(&self, highest_note: &str) -> Option<i32> {
        let highest = Note::parse(highest_note)?;
        let ceiling = Note::parse(&self.max_note)?;
        Some(ceiling.semitone() - highest.semitone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_policy_allows_everything() {
        let policy = SafePitchPolicy::default();
        assert!(policy.check(Some("G3"), 0, 12, KeyPreference::Sharps).is_ok());
    }

    #[test]
    fn rejects_increase_past_ceiling() {
        let policy = SafePitchPolicy::enabled("G3");
        assert!(policy.check(Some("E3"), 0, 3, KeyPreference::Sharps).is_ok());

        let err = policy.check(Some("E3"), 3, 4, KeyPreference::Sharps).unwrap_err();
        assert_eq!(
            err,
            SyncError::SafePitchExceeded {
                pitch: 4,
                note: "G#3".into(),
                ceiling: "G3".into(),
            }
        );
    }

    #[test]
    fn decreases_are_always_allowed() {
        let policy = SafePitchPolicy::enabled("G3");
        // already above the ceiling, but moving down
        assert!(policy.check(Some("C4"), 5, 2, KeyPreference::Sharps).is_ok());
    }

    #[test]
    fn songs_without_a_range_are_not_checked() {
        let policy = SafePitchPolicy::enabled("G3");
        assert!(policy.check(None, 0, 24, KeyPreference::Sharps).is_ok());
        assert!(policy.check(Some("??"), 0, 24, KeyPreference::Sharps).is_ok());
    }

    #[test]
    fn max_pitch_is_the_distance_to_the_ceiling() {
        let policy = SafePitchPolicy::enabled("G3");
        assert_eq!(policy.max_pitch("E3"), Some(3));
        assert_eq!(policy.max_pitch("A3"), Some(-2));
    }
}
