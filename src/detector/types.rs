//! Key input and notification types for scan detection.
//!
//! Keys are logical values as the hosting input surface reports them: a
//! printable character or the terminator key a scanner appends to every
//! payload. Timing uses monotonic instants so replayed traces and live
//! capture go through the same code path.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A logical key value from the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// The Enter key, which scanners send after every payload.
    Enter,
}

impl Key {
    /// Parse a browser-style key string (`"a"`, `"Enter"`).
    ///
    /// Returns `None` for modifier and navigation keys (`"Shift"`,
    /// `"ArrowDown"`, ...) which never reach a keypress stream as text.
    pub fn from_key_str(s: &str) -> Option<Self> {
        if s == "Enter" {
            return Some(Key::Enter);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Key::Char(c)),
            _ => None,
        }
    }

    /// The browser-style key string for this key.
    pub fn as_key_string(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Enter => "Enter".to_string(),
        }
    }
}

// Keys appear in trace files and in the config, so they serialize as their
// key string rather than as an enum tag.
impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_key_string())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Key::from_key_str(&s)
            .ok_or_else(|| de::Error::custom(format!("unrecognized key name: {s:?}")))
    }
}

/// A single keystroke with its arrival time.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    /// The logical key value.
    pub key: Key,
    /// Monotonic arrival time.
    pub at: Instant,
}

impl KeyEvent {
    /// Create an event stamped with the current time.
    pub fn now(key: Key) -> Self {
        Self {
            key,
            at: Instant::now(),
        }
    }

    /// Create an event with an explicit arrival time (trace replay).
    pub fn at(key: Key, at: Instant) -> Self {
        Self { key, at }
    }
}

/// The notification published for an accepted scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Decoded payload, marker and terminator excluded.
    pub payload: String,
    /// Observed average input speed in milliseconds per character.
    pub speed_ms_per_char: f64,
    /// Number of captured payload characters.
    pub char_count: usize,
    /// Wall-clock time the run completed.
    pub completed_at: DateTime<Utc>,
}

/// Why an armed run was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Average speed exceeded the threshold; classified as human typing.
    TooSlow,
    /// Terminator arrived with zero captured characters.
    EmptyCapture,
    /// Capture grew past the configured cap and the run was abandoned.
    CaptureOverflow,
}

/// What the detector did with one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Detector idle; the key is ordinary input.
    PassThrough,
    /// This key completed the marker and armed a capture.
    Armed,
    /// The key was accumulated into an armed capture.
    Captured,
    /// The terminator closed an armed run and a scan was published.
    Accepted,
    /// The armed run was discarded.
    Rejected(RejectReason),
}

impl KeyOutcome {
    /// Whether the hosting surface should suppress the key's default effect.
    ///
    /// True exactly when the terminator closed an armed run, so scanner
    /// input never submits a surrounding form.
    pub fn suppresses_default(&self) -> bool {
        matches!(
            self,
            KeyOutcome::Accepted
                | KeyOutcome::Rejected(RejectReason::TooSlow)
                | KeyOutcome::Rejected(RejectReason::EmptyCapture)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_string_round_trip() {
        assert_eq!(Key::from_key_str("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_key_str("{"), Some(Key::Char('{')));
        assert_eq!(Key::from_key_str("Enter"), Some(Key::Enter));
        assert_eq!(Key::Char('7').as_key_string(), "7");
        assert_eq!(Key::Enter.as_key_string(), "Enter");
    }

    #[test]
    fn test_modifier_keys_rejected() {
        assert_eq!(Key::from_key_str("Shift"), None);
        assert_eq!(Key::from_key_str("ArrowDown"), None);
        assert_eq!(Key::from_key_str(""), None);
    }

    #[test]
    fn test_suppresses_default() {
        assert!(KeyOutcome::Accepted.suppresses_default());
        assert!(KeyOutcome::Rejected(RejectReason::TooSlow).suppresses_default());
        assert!(KeyOutcome::Rejected(RejectReason::EmptyCapture).suppresses_default());
        assert!(!KeyOutcome::Rejected(RejectReason::CaptureOverflow).suppresses_default());
        assert!(!KeyOutcome::PassThrough.suppresses_default());
        assert!(!KeyOutcome::Captured.suppresses_default());
        assert!(!KeyOutcome::Armed.suppresses_default());
    }
}
