//! Demonstration of the Keystroke Insight pipeline without a terminal.
//!
//! This example shows how to:
//! 1. Arm a collector and feed it key events
//! 2. Record queued events into a capture session
//! 3. Compute session statistics
//! 4. Build the feature payload for analysis
//! 5. Render the text export
//!
//! Run with: cargo run --example replay_demo

use chrono::{Duration, Utc};
use keystroke_insight::{
    collector::{Collector, CollectorConfig, KeyType, RawKeyEvent},
    core::{CaptureSession, MIN_ENTRIES_FOR_ANALYSIS},
    export,
    transparency::create_shared_log,
};

fn main() {
    println!("Keystroke Insight - Replay Demo");
    println!("===============================");
    println!();

    let start = Utc::now();
    let transparency = create_shared_log();
    let mut session = CaptureSession::new(start).with_transparency(transparency.clone());
    let mut collector = Collector::new(CollectorConfig::default());

    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        return;
    }

    // "Hello, world" typed with a slightly uneven rhythm
    let keys = [
        ("Shift", "ShiftLeft", 400),
        ("H", "KeyH", 90),
        ("e", "KeyE", 140),
        ("l", "KeyL", 120),
        ("l", "KeyL", 110),
        ("o", "KeyO", 160),
        (",", "Comma", 220),
        (" ", "Space", 130),
        ("w", "KeyW", 300),
        ("o", "KeyO", 120),
        ("r", "KeyR", 100),
        ("l", "KeyL", 115),
        ("d", "KeyD", 125),
        ("Enter", "Enter", 350),
    ];

    let mut at = start;
    for (key, code, gap_ms) in keys {
        at += Duration::milliseconds(gap_ms);
        collector.submit(RawKeyEvent::at(key, code, at));
    }

    while let Some(raw) = collector.try_recv() {
        let entry = session.record(raw);
        println!("{}  {}", export::format_line(entry), entry.key_type());
    }
    collector.stop();

    let stats = session.stats();
    println!();
    println!("Keys captured: {}", stats.total_keys);
    println!("Words per minute: {}", stats.wpm);
    println!("Average interval: {}ms", stats.average_interval);
    println!("Interval std dev: {:.1}ms", stats.interval_std_dev);
    for key_type in KeyType::ALL {
        println!("  {key_type}: {}", stats.type_counts.get(key_type));
    }

    println!();
    match session.features() {
        Ok(payload) => {
            println!("Feature payload (needs {MIN_ENTRIES_FOR_ANALYSIS}+ keys):");
            println!("  sequence: {:?}", payload.sequence);
            println!("  timings:  {:?}", payload.timings);
        }
        Err(e) => println!("{e}"),
    }

    println!();
    println!("Text export:");
    print!("{}", export::render_text(&session.snapshot()));

    println!();
    println!("{}", transparency.summary());
}
