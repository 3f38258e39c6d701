//! Cumulative detector statistics.
//!
//! Counts what the detector saw and decided, without retaining any payload
//! content. Counters can be persisted across sessions as JSON.

use crate::detector::types::{KeyOutcome, RejectReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the current session.
#[derive(Debug)]
pub struct DetectorStats {
    /// Keystrokes observed
    keys_observed: AtomicU64,
    /// Runs that armed (marker recognized)
    runs_armed: AtomicU64,
    /// Runs accepted and published
    scans_accepted: AtomicU64,
    /// Runs rejected as human typing
    rejected_slow: AtomicU64,
    /// Runs rejected with an empty capture
    rejected_empty: AtomicU64,
    /// Runs abandoned at the capture cap
    rejected_overflow: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl DetectorStats {
    pub fn new() -> Self {
        Self {
            keys_observed: AtomicU64::new(0),
            runs_armed: AtomicU64::new(0),
            scans_accepted: AtomicU64::new(0),
            rejected_slow: AtomicU64::new(0),
            rejected_empty: AtomicU64::new(0),
            rejected_overflow: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a stats log that loads from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            eprintln!("Note: Could not load previous detector stats: {e}");
        }

        stats
    }

    /// Record the outcome of one keystroke.
    pub fn record_key(&self, outcome: KeyOutcome) {
        self.keys_observed.fetch_add(1, Ordering::Relaxed);
        match outcome {
            KeyOutcome::Armed => {
                self.runs_armed.fetch_add(1, Ordering::Relaxed);
            }
            KeyOutcome::Accepted => {
                self.scans_accepted.fetch_add(1, Ordering::Relaxed);
            }
            KeyOutcome::Rejected(RejectReason::TooSlow) => {
                self.rejected_slow.fetch_add(1, Ordering::Relaxed);
            }
            KeyOutcome::Rejected(RejectReason::EmptyCapture) => {
                self.rejected_empty.fetch_add(1, Ordering::Relaxed);
            }
            KeyOutcome::Rejected(RejectReason::CaptureOverflow) => {
                self.rejected_overflow.fetch_add(1, Ordering::Relaxed);
            }
            KeyOutcome::PassThrough | KeyOutcome::Captured => {}
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            keys_observed: self.keys_observed.load(Ordering::Relaxed),
            runs_armed: self.runs_armed.load(Ordering::Relaxed),
            scans_accepted: self.scans_accepted.load(Ordering::Relaxed),
            rejected_slow: self.rejected_slow.load(Ordering::Relaxed),
            rejected_empty: self.rejected_empty.load(Ordering::Relaxed),
            rejected_overflow: self.rejected_overflow.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Detector Statistics:\n\
             - Keystrokes observed: {}\n\
             - Runs armed: {}\n\
             - Scans accepted: {}\n\
             - Rejected (too slow): {}\n\
             - Rejected (empty capture): {}\n\
             - Abandoned (capture cap): {}\n\
             - Session duration: {} seconds",
            stats.keys_observed,
            stats.runs_armed,
            stats.scans_accepted,
            stats.rejected_slow,
            stats.rejected_empty,
            stats.rejected_overflow,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                keys_observed: stats.keys_observed,
                runs_armed: stats.runs_armed,
                scans_accepted: stats.scans_accepted,
                rejected_slow: stats.rejected_slow,
                rejected_empty: stats.rejected_empty,
                rejected_overflow: stats.rejected_overflow,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats = serde_json::from_str(&content)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

                self.keys_observed
                    .store(persisted.keys_observed, Ordering::Relaxed);
                self.runs_armed.store(persisted.runs_armed, Ordering::Relaxed);
                self.scans_accepted
                    .store(persisted.scans_accepted, Ordering::Relaxed);
                self.rejected_slow
                    .store(persisted.rejected_slow, Ordering::Relaxed);
                self.rejected_empty
                    .store(persisted.rejected_empty, Ordering::Relaxed);
                self.rejected_overflow
                    .store(persisted.rejected_overflow, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.keys_observed.store(0, Ordering::Relaxed);
        self.runs_armed.store(0, Ordering::Relaxed);
        self.scans_accepted.store(0, Ordering::Relaxed);
        self.rejected_slow.store(0, Ordering::Relaxed);
        self.rejected_empty.store(0, Ordering::Relaxed);
        self.rejected_overflow.store(0, Ordering::Relaxed);
    }
}

impl Default for DetectorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of detector statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub keys_observed: u64,
    pub runs_armed: u64,
    pub scans_accepted: u64,
    pub rejected_slow: u64,
    pub rejected_empty: u64,
    pub rejected_overflow: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    keys_observed: u64,
    runs_armed: u64,
    scans_accepted: u64,
    rejected_slow: u64,
    rejected_empty: u64,
    rejected_overflow: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared stats log.
pub type SharedDetectorStats = Arc<DetectorStats>;

/// Create a new shared stats log.
pub fn create_shared_stats() -> SharedDetectorStats {
    Arc::new(DetectorStats::new())
}

/// Create a new shared stats log with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedDetectorStats {
    Arc::new(DetectorStats::with_persistence(path))
}
