//! Barcode scan detection from keystroke timing.
//!
//! This module contains:
//! - Key input and notification types
//! - The per-run session state (prefix window, idle/armed)
//! - The detector itself

pub mod engine;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use engine::ScanDetector;
pub use session::{PrefixWindow, ScanSession, SessionState};
pub use types::{Key, KeyEvent, KeyOutcome, RejectReason, ScanEvent};
