//! Core capture pipeline.
//!
//! This module contains:
//! - Key classification and interval tracking
//! - Entry construction and the append-only session log
//! - Session statistics and feature extraction
//! - The capture session tying them together

pub mod capture;
pub mod classifier;
pub mod entry;
pub mod features;
pub mod interval;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use capture::{AnalyzeError, CaptureSession, SharedCaptureSession};
pub use classifier::classify;
pub use entry::build_entry;
pub use features::{
    extract, prepare, FeaturePayload, NotEnoughData, MAX_TIMINGS, MIN_ENTRIES_FOR_ANALYSIS,
};
pub use interval::IntervalTracker;
pub use session::{SessionLog, Snapshot};
pub use stats::{compute_stats, SessionStats, TypeCounts};
