//! Per-run detection state.
//!
//! The session is transient: it never survives a completed run. The prefix
//! window is maintained independently on every keystroke, idle or armed, and
//! is deliberately not reset when a run completes.

use crate::detector::types::Key;
use std::collections::VecDeque;
use std::time::Instant;

/// Fixed-capacity FIFO window over the most recent keys.
///
/// Holds exactly the last `min(capacity, keys seen)` keys, oldest evicted
/// first. Used only to recognize the marker before arming.
#[derive(Debug)]
pub struct PrefixWindow {
    keys: VecDeque<Key>,
    capacity: usize,
}

impl PrefixWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push a key, evicting the oldest once the window is full.
    pub fn push(&mut self, key: Key) {
        if self.capacity == 0 {
            return;
        }
        self.keys.push_back(key);
        if self.keys.len() > self.capacity {
            self.keys.pop_front();
        }
    }

    /// Whether the window currently holds exactly the marker.
    ///
    /// The terminator occupies a slot like any key but can never equal a
    /// marker character, so a marker run interrupted by it does not match.
    pub fn matches(&self, marker: &str) -> bool {
        if marker.is_empty() || self.keys.len() != marker.chars().count() {
            return false;
        }
        self.keys
            .iter()
            .zip(marker.chars())
            .all(|(key, expected)| matches!(key, Key::Char(c) if *c == expected))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The buffered keys, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }
}

/// Run state of the detector.
///
/// `Armed` carries the start instant and the capture buffer together, so an
/// armed session always has both and an idle session has neither.
#[derive(Debug)]
pub enum SessionState {
    Idle,
    Armed {
        /// Instant the marker was completed.
        started_at: Instant,
        /// Characters captured since arming. Marker characters are never
        /// part of this buffer.
        buffer: String,
    },
}

/// The detector's complete mutable state: run state plus prefix window.
#[derive(Debug)]
pub struct ScanSession {
    state: SessionState,
    window: PrefixWindow,
}

impl ScanSession {
    /// Create an idle session with a window sized for the marker.
    pub fn new(marker_len: usize) -> Self {
        Self {
            state: SessionState::Idle,
            window: PrefixWindow::new(marker_len),
        }
    }

    /// Slide the prefix window. Called for every keystroke.
    pub fn observe(&mut self, key: Key) {
        self.window.push(key);
    }

    pub fn marker_matched(&self, marker: &str) -> bool {
        self.window.matches(marker)
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SessionState::Armed { .. })
    }

    /// Begin a capture at the given instant with an empty buffer.
    pub fn arm(&mut self, at: Instant) {
        self.state = SessionState::Armed {
            started_at: at,
            buffer: String::new(),
        };
    }

    /// Append a captured character; returns the new capture length in
    /// characters. No-op while idle.
    pub fn capture(&mut self, c: char) -> usize {
        match &mut self.state {
            SessionState::Armed { buffer, .. } => {
                buffer.push(c);
                buffer.chars().count()
            }
            SessionState::Idle => 0,
        }
    }

    /// End the run, returning the start instant and capture if armed.
    /// The session is idle afterwards; the prefix window keeps sliding.
    pub fn disarm(&mut self) -> Option<(Instant, String)> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Armed { started_at, buffer } => Some((started_at, buffer)),
            SessionState::Idle => None,
        }
    }

    /// Force the session back to idle, discarding any capture.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn window(&self) -> &PrefixWindow {
        &self.window
    }
}
