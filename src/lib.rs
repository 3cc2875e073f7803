//! Keystroke Insight - keystroke capture and session analytics.
//!
//! This library captures key presses, enriches each one with its interval
//! since the previous key and a category, aggregates session statistics, and
//! prepares a bounded feature summary for an external analysis service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Keystroke Insight                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│   Entry     │──▶│ Session Log │       │
//! │  │ (armed gate)│   │  Builder    │   │ (append)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                      │        │             │ snapshot      │
//! │              ┌───────┘        └──────┐      ▼               │
//! │       ┌─────────────┐   ┌───────────┐ ┌─────────────┐       │
//! │       │  Interval   │   │Classifier │ │ Stats and   │──▶ analysis
//! │       │  Tracker    │   │           │ │ Features    │       │
//! │       └─────────────┘   └───────────┘ └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use keystroke_insight::{CaptureSession, RawKeyEvent};
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.timestamp_millis_opt(1_000).unwrap();
//! let mut session = CaptureSession::new(start);
//! for (key, at) in [("a", 1_000), ("b", 1_300), ("c", 1_900)] {
//!     let at = Utc.timestamp_millis_opt(at).unwrap();
//!     session.record(RawKeyEvent::at(key, format!("Key{}", key.to_uppercase()), at));
//! }
//!
//! let stats = session.stats();
//! assert_eq!(stats.total_keys, 3);
//! assert_eq!(stats.average_interval, 300);
//! ```

pub mod analysis;
pub mod collector;
pub mod config;
pub mod core;
pub mod export;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use analysis::{AnalysisError, AnalysisRequest, AnalysisSlot, AnalysisState, Analyzer};
pub use collector::{Collector, CollectorConfig, CollectorError, KeyEntry, KeyType, RawKeyEvent};
pub use config::{AnalysisConfig, Config};
pub use core::{
    classify, compute_stats, extract, CaptureSession, FeaturePayload, SessionStats,
    SharedCaptureSession, Snapshot,
};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

// Analysis client re-exports (when enabled)
#[cfg(feature = "analysis")]
pub use analysis::{BlockingHttpAnalyzer, HttpAnalyzer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown before capture starts.
pub const CAPTURE_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                KEYSTROKE INSIGHT - CAPTURE NOTICE                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  While capture is armed, every key you press in this terminal    ║
║  is recorded: the key, its position, and when it was pressed.    ║
║                                                                  ║
║  Keys are kept in memory only and are discarded on reset or      ║
║  exit unless you export them. Requesting an analysis sends the   ║
║  key sequence and the first 50 intervals to the configured       ║
║  analysis service.                                               ║
║                                                                  ║
║    Ctrl+P  pause / resume        Ctrl+E  export                  ║
║    Ctrl+R  reset session         Ctrl+A  analyse                 ║
║    Ctrl+C  stop                                                  ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
