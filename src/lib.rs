//! Scanwedge - keyboard-wedge barcode scan detection.
//!
//! Hardware barcode scanners in keyboard-emulation mode ("keyboard wedge")
//! type an entire payload in a few milliseconds per character, preceded by a
//! programmable prefix and closed with Enter. This library watches a raw
//! keystroke stream, recognizes the prefix marker, times the run, and
//! publishes the decoded payload to subscribers when the run is fast enough
//! to be a scan. Human typing passes through untouched; misreads are
//! discarded silently.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Scanwedge                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐      │
//! │  │  Key input  │──▶│ ScanDetector │──▶│   ScanBus   │      │
//! │  │(trace/live) │   │ (IDLE/ARMED) │   │  (fan-out)  │      │
//! │  └─────────────┘   └──────────────┘   └─────────────┘      │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │DetectorStats│   │ ScanRouter  │       │
//! │                    └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use scanwedge::{DetectorConfig, Key, KeyEvent, ScanDetector};
//!
//! let mut detector = ScanDetector::new(DetectorConfig::default());
//! detector.subscribe(|scan| println!("decoded: {}", scan.payload));
//!
//! // A scanner types the marker, the payload, then Enter.
//! for c in "{BAR}12345".chars() {
//!     detector.handle_key(KeyEvent::now(Key::Char(c)));
//! }
//! detector.handle_key(KeyEvent::now(Key::Enter));
//! ```

pub mod bus;
pub mod config;
pub mod detector;
pub mod dispatch;
pub mod stats;
pub mod trace;

// Re-export key types at crate root for convenience
pub use bus::ScanBus;
pub use config::{Config, ConfigError, DetectorConfig};
pub use detector::{Key, KeyEvent, KeyOutcome, RejectReason, ScanDetector, ScanEvent};
pub use dispatch::{ScanAction, ScanRouter};
pub use stats::{
    create_shared_stats, create_shared_stats_with_persistence, DetectorStats, SharedDetectorStats,
    StatsSnapshot,
};
pub use trace::{TraceEntry, TraceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
