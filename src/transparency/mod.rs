//! Transparency module for Keystroke Insight.
//!
//! Tracks what the capture pipeline recorded, dropped and sent out.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, SharedTransparencyLog, TransparencyLog, TransparencyStats};
