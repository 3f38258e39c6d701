//! Recorded keystroke traces.
//!
//! A trace is a sequence of key names with millisecond offsets from the
//! start of the recording, stored as JSON Lines. Traces make detector runs
//! replayable: the same file drives the CLI, the demo, and regression tests.
//! Generators produce synthetic scanner bursts and human typing for
//! experiments without hardware.

use crate::detector::types::{Key, KeyEvent};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// One recorded keystroke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Browser-style key name (`"a"`, `"Enter"`).
    pub key: String,
    /// Offset from the start of the recording, in milliseconds.
    pub offset_ms: u64,
}

/// Trace file errors.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid trace entry on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Load a JSONL trace file. Blank lines are skipped.
pub fn load_jsonl(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
            line: idx + 1,
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Save a trace as JSONL.
pub fn save_jsonl(path: &Path, entries: &[TraceEntry]) -> Result<(), TraceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    for entry in entries {
        let line = serde_json::to_string(entry).map_err(|source| TraceError::Parse {
            line: 0,
            source,
        })?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Convert trace entries into key events relative to `base`.
///
/// Entries with key names the detector has no use for (modifiers,
/// navigation keys) are skipped, matching an input surface that only
/// reports printable keys and the terminator.
pub fn to_key_events(entries: &[TraceEntry], base: Instant) -> Vec<KeyEvent> {
    entries
        .iter()
        .filter_map(|entry| match Key::from_key_str(&entry.key) {
            Some(key) => Some(KeyEvent::at(key, base + Duration::from_millis(entry.offset_ms))),
            None => {
                debug!(key = %entry.key, "skipping non-text key in trace");
                None
            }
        })
        .collect()
}

/// Synthesize the trace a scanner produces: marker, payload, Enter, at a
/// uniform pace.
pub fn scanner_burst(marker: &str, payload: &str, ms_per_char: u64) -> Vec<TraceEntry> {
    let keys = marker.chars().chain(payload.chars());
    let mut entries: Vec<TraceEntry> = keys
        .enumerate()
        .map(|(i, c)| TraceEntry {
            key: c.to_string(),
            offset_ms: i as u64 * ms_per_char,
        })
        .collect();
    entries.push(TraceEntry {
        key: "Enter".to_string(),
        offset_ms: entries.len() as u64 * ms_per_char,
    });
    entries
}

/// Synthesize a human typing the same text and pressing Enter.
pub fn human_typing(text: &str, ms_per_char: u64) -> Vec<TraceEntry> {
    let mut entries: Vec<TraceEntry> = text
        .chars()
        .enumerate()
        .map(|(i, c)| TraceEntry {
            key: c.to_string(),
            offset_ms: i as u64 * ms_per_char,
        })
        .collect();
    entries.push(TraceEntry {
        key: "Enter".to_string(),
        offset_ms: entries.len() as u64 * ms_per_char,
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_burst_shape() {
        let entries = scanner_burst("{BAR}", "123", 5);

        assert_eq!(entries.len(), 9);
        assert_eq!(entries[0].key, "{");
        assert_eq!(entries[0].offset_ms, 0);
        assert_eq!(entries[7].key, "3");
        assert_eq!(entries[8].key, "Enter");
        assert_eq!(entries[8].offset_ms, 40);
    }

    #[test]
    fn test_human_typing_shape() {
        let entries = human_typing("hi", 120);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].key, "Enter");
        assert_eq!(entries[2].offset_ms, 240);
    }

    #[test]
    fn test_to_key_events_skips_unknown_keys() {
        let entries = vec![
            TraceEntry {
                key: "a".to_string(),
                offset_ms: 0,
            },
            TraceEntry {
                key: "Shift".to_string(),
                offset_ms: 3,
            },
            TraceEntry {
                key: "Enter".to_string(),
                offset_ms: 6,
            },
        ];

        let base = Instant::now();
        let events = to_key_events(&entries, base);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, Key::Char('a'));
        assert_eq!(events[1].key, Key::Enter);
        assert_eq!(events[1].at, base + Duration::from_millis(6));
    }

    #[test]
    fn test_jsonl_round_trip() {
        let path = std::env::temp_dir().join("scanwedge-trace-test.jsonl");
        let entries = scanner_burst("{BAR}", "X1", 5);

        save_jsonl(&path, &entries).unwrap();
        let loaded = load_jsonl(&path).unwrap();

        assert_eq!(loaded.len(), entries.len());
        assert_eq!(loaded[0].key, entries[0].key);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let path = std::env::temp_dir().join("scanwedge-trace-bad.jsonl");
        std::fs::write(
            &path,
            "{\"key\":\"a\",\"offset_ms\":0}\nnot json at all\n",
        )
        .unwrap();

        let err = load_jsonl(&path).unwrap_err();
        match err {
            TraceError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other}"),
        }

        let _ = std::fs::remove_file(&path);
    }
}
