//! Scanwedge CLI
//!
//! Replay, simulate, and live-capture keystroke streams through the
//! barcode-scan detector.

use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use scanwedge::{
    trace, Config, DetectorStats, Key, KeyEvent, ScanDetector, TraceEntry, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scanwedge")]
#[command(version = VERSION)]
#[command(about = "Keyboard-wedge barcode scan detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded keystroke trace through the detector
    Replay {
        /// Trace file (JSONL: {"key": "a", "offset_ms": 0})
        input: PathBuf,

        /// Print accepted scans as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic keystroke trace and run or save it
    Simulate {
        /// Payload the scanner encodes
        #[arg(long, default_value = "0123456789")]
        payload: String,

        /// Milliseconds between keystrokes (default: 5, or 120 with --human)
        #[arg(long)]
        speed_ms: Option<u64>,

        /// Simulate a human typing the same keys instead of a scanner burst
        #[arg(long)]
        human: bool,

        /// Write the trace to a file instead of replaying it
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Capture keystrokes live from this terminal
    Listen {
        /// Stop after this many seconds (default: run until Esc/Ctrl+C)
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Show cumulative detector statistics
    Stats,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { input, json } => {
            cmd_replay(&input, json);
        }
        Commands::Simulate {
            payload,
            speed_ms,
            human,
            output,
        } => {
            cmd_simulate(&payload, speed_ms, human, output);
        }
        Commands::Listen { duration_secs } => {
            cmd_listen(duration_secs);
        }
        Commands::Stats => {
            cmd_stats();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config: {e}");
            Config::default()
        }
    }
}

/// Run trace entries through a fresh detector and report the results.
fn replay_entries(config: &Config, entries: &[TraceEntry], json: bool) {
    let mut detector = ScanDetector::new(config.detector.clone());
    let receiver = detector.subscribe_channel();
    let stats = DetectorStats::new();

    let events = trace::to_key_events(entries, Instant::now());
    for event in events {
        let outcome = detector.handle_key(event);
        stats.record_key(outcome);
    }

    let mut accepted = 0;
    for scan in receiver.try_iter() {
        accepted += 1;
        if json {
            match serde_json::to_string(&scan) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("Error serializing scan: {e}"),
            }
        } else {
            println!(
                "scan: {} ({:.1} ms/char, {} chars)",
                scan.payload, scan.speed_ms_per_char, scan.char_count
            );
        }
    }

    if !json {
        if accepted == 0 {
            println!("No scans detected.");
        }
        println!();
        println!("{}", stats.summary());
    }
}

fn cmd_replay(input: &Path, json: bool) {
    let config = load_config();

    let entries = match trace::load_jsonl(input) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading trace: {e}");
            std::process::exit(1);
        }
    };

    if !json {
        println!("Replaying {} keystrokes from {input:?}", entries.len());
        println!();
    }
    replay_entries(&config, &entries, json);
}

fn cmd_simulate(payload: &str, speed_ms: Option<u64>, human: bool, output: Option<PathBuf>) {
    let config = load_config();

    let pace = speed_ms.unwrap_or(if human { 120 } else { 5 });
    let entries = if human {
        // A human typing the full sequence, marker included, at typing pace.
        trace::human_typing(&format!("{}{payload}", config.detector.marker_prefix), pace)
    } else {
        trace::scanner_burst(&config.detector.marker_prefix, payload, pace)
    };

    match output {
        Some(path) => {
            if let Err(e) = trace::save_jsonl(&path, &entries) {
                eprintln!("Error writing trace: {e}");
                std::process::exit(1);
            }
            println!("Wrote {} keystrokes to {path:?}", entries.len());
        }
        None => {
            println!(
                "Simulating {} at {pace} ms/char",
                if human { "human typing" } else { "a scanner burst" }
            );
            println!();
            replay_entries(&config, &entries, false);
        }
    }
}

fn cmd_listen(duration_secs: Option<u64>) {
    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create data directory: {e}");
    }

    let stats = scanwedge::create_shared_stats_with_persistence(config.data_path.join("stats.json"));
    let mut detector = ScanDetector::new(config.detector.clone());
    let receiver = detector.subscribe_channel();

    println!("Scanwedge v{VERSION}");
    println!(
        "Listening for scanner input (marker {:?}, threshold {} ms/char)",
        config.detector.marker_prefix, config.detector.speed_threshold_ms
    );
    println!("Press Esc or Ctrl+C to stop.");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        eprintln!("Warning: could not install Ctrl+C handler: {e}");
    }

    if let Err(e) = terminal::enable_raw_mode() {
        eprintln!("Error enabling raw mode: {e}");
        std::process::exit(1);
    }

    let started = Instant::now();
    while running.load(Ordering::SeqCst) {
        if let Some(limit) = duration_secs {
            if started.elapsed() >= Duration::from_secs(limit) {
                break;
            }
        }

        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Esc
                        || (key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    let mapped = match key.code {
                        KeyCode::Char(c) => Some(Key::Char(c)),
                        KeyCode::Enter => Some(Key::Enter),
                        _ => None,
                    };
                    if let Some(k) = mapped {
                        let outcome = detector.handle_key(KeyEvent::now(k));
                        stats.record_key(outcome);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprint!("Input error: {e}\r\n");
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                eprint!("Input error: {e}\r\n");
                break;
            }
        }

        for scan in receiver.try_iter() {
            print!(
                "[{}] scan detected: {} ({:.1} ms/char)\r\n",
                scan.completed_at.format("%H:%M:%S"),
                scan.payload,
                scan.speed_ms_per_char
            );
        }
    }

    if let Err(e) = terminal::disable_raw_mode() {
        eprintln!("Warning: could not restore terminal: {e}");
    }

    println!();
    println!("Stopping capture...");
    if let Err(e) = stats.save() {
        eprintln!("Warning: could not save stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_stats() {
    let config = load_config();

    println!("Scanwedge Statistics");
    println!("====================");
    println!();

    let stats_path = config.data_path.join("stats.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(keys) = stats.get("keys_observed") {
                    println!("  Keystrokes observed: {keys}");
                }
                if let Some(armed) = stats.get("runs_armed") {
                    println!("  Runs armed: {armed}");
                }
                if let Some(accepted) = stats.get("scans_accepted") {
                    println!("  Scans accepted: {accepted}");
                }
                if let Some(slow) = stats.get("rejected_slow") {
                    println!("  Rejected (too slow): {slow}");
                }
                if let Some(empty) = stats.get("rejected_empty") {
                    println!("  Rejected (empty capture): {empty}");
                }
                if let Some(overflow) = stats.get("rejected_overflow") {
                    println!("  Abandoned (capture cap): {overflow}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
        println!("Run 'scanwedge listen' to start capturing.");
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
