//! Demonstration of scanwedge detection on synthetic keystroke traces.
//!
//! This example shows how to:
//! 1. Configure and create a detector
//! 2. Subscribe to decoded scans
//! 3. Route scans with a ScanRouter
//! 4. Replay traces through the detector
//!
//! Run with: cargo run --example replay_demo

use std::sync::{Arc, Mutex};
use std::time::Instant;

use scanwedge::{
    trace, DetectorConfig, DetectorStats, ScanAction, ScanDetector, ScanRouter,
};

fn main() {
    println!("Scanwedge - Replay Demo");
    println!("=======================");
    println!();

    let config = DetectorConfig::default();
    println!("Marker prefix: {:?}", config.marker_prefix);
    println!("Speed threshold: {} ms/char", config.speed_threshold_ms);
    println!();

    let mut detector = ScanDetector::new(config.clone());
    let stats = DetectorStats::new();

    // A router decides what a page would do with each decoded payload.
    let router = Arc::new(Mutex::new(ScanRouter::new("/barcode/{}/")));
    router
        .lock()
        .unwrap()
        .map_target("new-crop-form-barcode", "form-new-crop-slot");

    let actions = Arc::new(Mutex::new(Vec::new()));
    let router_sub = router.clone();
    let actions_sub = actions.clone();
    detector.subscribe(move |scan| {
        let action = router_sub.lock().unwrap().dispatch(&scan.payload);
        actions_sub.lock().unwrap().push(action);
    });

    // A scanner burst: marker + payload + Enter at 5 ms per character.
    println!("Feeding a scanner burst encoding \"TRAY-042\"...");
    let burst = trace::scanner_burst(&config.marker_prefix, "TRAY-042", 5);
    for event in trace::to_key_events(&burst, Instant::now()) {
        stats.record_key(detector.handle_key(event));
    }

    // The same payload typed by a human at 120 ms per character.
    println!("Feeding the same keys at human typing speed...");
    let typed = trace::human_typing(&format!("{}TRAY-042", config.marker_prefix), 120);
    for event in trace::to_key_events(&typed, Instant::now()) {
        stats.record_key(detector.handle_key(event));
    }

    // A scan arriving while an input target is selected gets filled in
    // instead of navigating.
    println!("Selecting a form target and scanning \"SLOT-7\"...");
    router.lock().unwrap().select_target("new-crop-form-barcode");
    let second = trace::scanner_burst(&config.marker_prefix, "SLOT-7", 5);
    for event in trace::to_key_events(&second, Instant::now()) {
        stats.record_key(detector.handle_key(event));
    }

    println!();
    println!("Routing decisions:");
    for action in actions.lock().unwrap().iter() {
        match action {
            ScanAction::Navigate(url) => println!("  navigate -> {url}"),
            ScanAction::Fill { target, value } => println!("  fill {target} with {value:?}"),
        }
    }

    println!();
    println!("{}", stats.summary());
    println!();
    println!("Demo complete!");
}
