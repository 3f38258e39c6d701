//! The scan detector: keystroke classification and notification publish.
//!
//! Scanners that emulate a keyboard type a fixed marker, the payload, and a
//! terminator at a few milliseconds per character. The detector arms when
//! the marker slides through the prefix window, accumulates payload
//! characters, and classifies the run by average speed when the terminator
//! arrives. Slow, empty, and overflowing runs are discarded silently so the
//! detector stays invisible to ordinary typing.

use crate::bus::ScanBus;
use crate::config::DetectorConfig;
use crate::detector::session::ScanSession;
use crate::detector::types::{Key, KeyEvent, KeyOutcome, RejectReason, ScanEvent};
use chrono::Utc;
use crossbeam_channel::Receiver;
use tracing::debug;

/// Bound for channel subscribers created through the detector.
const EVENT_QUEUE_BOUND: usize = 1024;

/// Stateful classifier for a live keystroke stream.
///
/// Owns its session exclusively; call [`handle_key`](Self::handle_key) once
/// per keystroke in arrival order.
pub struct ScanDetector {
    config: DetectorConfig,
    session: ScanSession,
    bus: ScanBus,
}

impl ScanDetector {
    /// Create an idle detector with its own notification bus.
    pub fn new(config: DetectorConfig) -> Self {
        let marker_len = config.marker_prefix.chars().count();
        Self {
            session: ScanSession::new(marker_len),
            bus: ScanBus::new(),
            config,
        }
    }

    /// Register a callback invoked synchronously for every accepted scan,
    /// in registration order.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&ScanEvent) + Send + 'static,
    {
        self.bus.subscribe(subscriber);
    }

    /// Register a bounded channel subscriber and return its receiver.
    pub fn subscribe_channel(&mut self) -> Receiver<ScanEvent> {
        self.bus.subscribe_channel(EVENT_QUEUE_BOUND)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_armed()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Process one keystroke.
    ///
    /// The prefix window slides on every key, idle or armed. All accepted
    /// scans are published before this returns; the session is back to idle
    /// after any completed run regardless of classification or subscriber
    /// behavior.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        self.session.observe(event.key);

        if !self.session.is_armed() {
            if self.session.marker_matched(&self.config.marker_prefix) {
                self.session.arm(event.at);
                debug!(marker = %self.config.marker_prefix, "marker recognized, capture armed");
                return KeyOutcome::Armed;
            }
            return KeyOutcome::PassThrough;
        }

        if event.key == self.config.terminator {
            return self.finish_run(event.at);
        }

        if let Key::Char(c) = event.key {
            let captured = self.session.capture(c);
            if captured > self.config.max_capture_len {
                self.session.reset();
                debug!(
                    limit = self.config.max_capture_len,
                    "capture exceeded cap, run abandoned"
                );
                return KeyOutcome::Rejected(RejectReason::CaptureOverflow);
            }
        }
        KeyOutcome::Captured
    }

    /// Classify and close the armed run ending at `ended_at`.
    fn finish_run(&mut self, ended_at: std::time::Instant) -> KeyOutcome {
        // The session goes idle before any subscriber runs, so a panicking
        // subscriber cannot leave a stale capture behind.
        let Some((started_at, buffer)) = self.session.disarm() else {
            return KeyOutcome::PassThrough;
        };

        let char_count = buffer.chars().count();
        if char_count == 0 {
            debug!("terminator with empty capture, run rejected");
            return KeyOutcome::Rejected(RejectReason::EmptyCapture);
        }

        let elapsed = ended_at.saturating_duration_since(started_at);
        let speed_ms_per_char = elapsed.as_secs_f64() * 1000.0 / char_count as f64;

        if speed_ms_per_char > self.config.speed_threshold_ms {
            debug!(
                speed_ms_per_char,
                threshold = self.config.speed_threshold_ms,
                "run too slow, classified as human typing"
            );
            return KeyOutcome::Rejected(RejectReason::TooSlow);
        }

        debug!(payload_len = char_count, speed_ms_per_char, "scan accepted");
        self.bus.publish(&ScanEvent {
            payload: buffer,
            speed_ms_per_char,
            char_count,
            completed_at: Utc::now(),
        });
        KeyOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    fn detector() -> ScanDetector {
        ScanDetector::new(DetectorConfig::default())
    }

    /// Feed `keys` at a fixed pace, Enter last, returning each outcome.
    fn feed_paced(detector: &mut ScanDetector, keys: &str, pace_ms: u64) -> Vec<KeyOutcome> {
        let base = Instant::now();
        let mut outcomes = Vec::new();
        for (i, c) in keys.chars().enumerate() {
            let at = base + Duration::from_millis(i as u64 * pace_ms);
            outcomes.push(detector.handle_key(KeyEvent::at(Key::Char(c), at)));
        }
        let at = base + Duration::from_millis(keys.chars().count() as u64 * pace_ms);
        outcomes.push(detector.handle_key(KeyEvent::at(Key::Enter, at)));
        outcomes
    }

    fn collected(detector: &mut ScanDetector) -> Arc<Mutex<Vec<String>>> {
        let scans = Arc::new(Mutex::new(Vec::new()));
        let sink = scans.clone();
        detector.subscribe(move |scan| sink.lock().unwrap().push(scan.payload.clone()));
        scans
    }

    #[test]
    fn test_fast_marked_run_is_accepted() {
        let mut det = detector();
        let scans = collected(&mut det);

        let outcomes = feed_paced(&mut det, "{BAR}123", 5);

        assert_eq!(outcomes[4], KeyOutcome::Armed);
        assert_eq!(outcomes[5], KeyOutcome::Captured);
        assert_eq!(*outcomes.last().unwrap(), KeyOutcome::Accepted);
        assert_eq!(*scans.lock().unwrap(), vec!["123".to_string()]);
        assert!(!det.is_armed());
    }

    #[test]
    fn test_slow_run_is_rejected_as_human() {
        let mut det = detector();
        let scans = collected(&mut det);

        let outcomes = feed_paced(&mut det, "{BAR}123", 50);

        assert_eq!(
            *outcomes.last().unwrap(),
            KeyOutcome::Rejected(RejectReason::TooSlow)
        );
        assert!(scans.lock().unwrap().is_empty());
        assert!(!det.is_armed());
    }

    #[test]
    fn test_unmarked_input_never_arms() {
        let mut det = detector();
        let scans = collected(&mut det);

        let outcomes = feed_paced(&mut det, "hello", 5);

        assert!(outcomes[..5]
            .iter()
            .all(|o| *o == KeyOutcome::PassThrough));
        // Enter while idle is ordinary input too.
        assert_eq!(*outcomes.last().unwrap(), KeyOutcome::PassThrough);
        assert!(scans.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_capture_is_rejected() {
        let mut det = detector();
        let scans = collected(&mut det);

        let outcomes = feed_paced(&mut det, "{BAR}", 5);

        assert_eq!(outcomes[4], KeyOutcome::Armed);
        assert_eq!(
            *outcomes.last().unwrap(),
            KeyOutcome::Rejected(RejectReason::EmptyCapture)
        );
        assert!(scans.lock().unwrap().is_empty());
    }

    #[test]
    fn test_speed_exactly_at_threshold_is_accepted() {
        let mut det = detector();
        let scans = collected(&mut det);
        let base = Instant::now();

        for (i, c) in "{BAR}".chars().enumerate() {
            det.handle_key(KeyEvent::at(
                Key::Char(c),
                base + Duration::from_millis(i as u64),
            ));
        }
        let armed_at = base + Duration::from_millis(4);
        det.handle_key(KeyEvent::at(Key::Char('4'), armed_at + Duration::from_millis(5)));
        det.handle_key(KeyEvent::at(Key::Char('2'), armed_at + Duration::from_millis(10)));

        // Two captured characters over 70 ms is exactly 35.0 ms/char.
        let outcome = det.handle_key(KeyEvent::at(
            Key::Enter,
            armed_at + Duration::from_millis(70),
        ));

        assert_eq!(outcome, KeyOutcome::Accepted);
        assert_eq!(*scans.lock().unwrap(), vec!["42".to_string()]);
    }

    #[test]
    fn test_speed_just_over_threshold_is_rejected() {
        let mut det = detector();
        let scans = collected(&mut det);
        let base = Instant::now();

        for (i, c) in "{BAR}".chars().enumerate() {
            det.handle_key(KeyEvent::at(
                Key::Char(c),
                base + Duration::from_millis(i as u64),
            ));
        }
        let armed_at = base + Duration::from_millis(4);
        det.handle_key(KeyEvent::at(Key::Char('4'), armed_at + Duration::from_millis(5)));
        det.handle_key(KeyEvent::at(Key::Char('2'), armed_at + Duration::from_millis(10)));

        let outcome = det.handle_key(KeyEvent::at(
            Key::Enter,
            armed_at + Duration::from_millis(72),
        ));

        assert_eq!(outcome, KeyOutcome::Rejected(RejectReason::TooSlow));
        assert!(scans.lock().unwrap().is_empty());
    }

    #[test]
    fn test_marker_speed_does_not_matter() {
        // The clock starts at arming, so a slowly typed marker followed by
        // a fast payload still classifies as a scan.
        let mut det = detector();
        let scans = collected(&mut det);
        let base = Instant::now();

        for (i, c) in "{BAR}".chars().enumerate() {
            let at = base + Duration::from_millis(i as u64 * 200);
            det.handle_key(KeyEvent::at(Key::Char(c), at));
        }
        let armed_at = base + Duration::from_millis(800);
        for (i, c) in "99".chars().enumerate() {
            let at = armed_at + Duration::from_millis((i as u64 + 1) * 5);
            det.handle_key(KeyEvent::at(Key::Char(c), at));
        }
        let outcome = det.handle_key(KeyEvent::at(
            Key::Enter,
            armed_at + Duration::from_millis(15),
        ));

        assert_eq!(outcome, KeyOutcome::Accepted);
        assert_eq!(*scans.lock().unwrap(), vec!["99".to_string()]);
    }

    #[test]
    fn test_capture_overflow_forces_idle() {
        let config = DetectorConfig {
            max_capture_len: 4,
            ..DetectorConfig::default()
        };
        let mut det = ScanDetector::new(config);
        let scans = collected(&mut det);

        let outcomes = feed_paced(&mut det, "{BAR}12345", 5);

        assert_eq!(
            outcomes[9],
            KeyOutcome::Rejected(RejectReason::CaptureOverflow)
        );
        // The trailing Enter arrives on an idle session.
        assert_eq!(*outcomes.last().unwrap(), KeyOutcome::PassThrough);
        assert!(scans.lock().unwrap().is_empty());
        assert!(!det.is_armed());
    }

    #[test]
    fn test_back_to_back_runs() {
        let mut det = detector();
        let scans = collected(&mut det);

        feed_paced(&mut det, "{BAR}first", 5);
        feed_paced(&mut det, "{BAR}second", 5);

        assert_eq!(
            *scans.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_marker_characters_never_reach_payload() {
        let mut det = detector();
        let scans = collected(&mut det);

        // Payload itself contains marker characters; only post-arm keys
        // accumulate, so they are payload, not a second arm.
        feed_paced(&mut det, "{BAR}{BAR}", 5);

        assert_eq!(*scans.lock().unwrap(), vec!["{BAR}".to_string()]);
    }

    #[test]
    fn test_subscribers_run_per_accepted_scan_only() {
        let mut det = detector();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        det.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        feed_paced(&mut det, "{BAR}ok", 5); // accepted
        feed_paced(&mut det, "{BAR}no", 50); // too slow
        feed_paced(&mut det, "plain", 5); // never armed

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
