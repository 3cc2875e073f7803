//! Capture transparency log.
//!
//! Counts what the capture pipeline did during this process's lifetime so
//! the user can see what was recorded, dropped and sent out. Counters live in
//! memory only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Capture counters for the current process.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Keys appended to a session log
    keys_captured: AtomicU64,
    /// Keys dropped while paused or because the queue was full
    keys_dropped: AtomicU64,
    /// Explicit session resets
    sessions_reset: AtomicU64,
    /// Analysis requests started
    analyses_requested: AtomicU64,
    /// Analysis requests that failed
    analyses_failed: AtomicU64,
    /// Export files written
    exports_written: AtomicU64,
    /// Keys whose timestamp went backwards
    clock_anomalies: AtomicU64,
    started_at: DateTime<Utc>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            keys_captured: AtomicU64::new(0),
            keys_dropped: AtomicU64::new(0),
            sessions_reset: AtomicU64::new(0),
            analyses_requested: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
            exports_written: AtomicU64::new(0),
            clock_anomalies: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_key_captured(&self) {
        self.keys_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keys_dropped(&self, count: u64) {
        self.keys_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_session_reset(&self) {
        self.sessions_reset.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_requested(&self) {
        self.analyses_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_failed(&self) {
        self.analyses_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_written(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clock_anomaly(&self) {
        self.clock_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            keys_captured: self.keys_captured.load(Ordering::Relaxed),
            keys_dropped: self.keys_dropped.load(Ordering::Relaxed),
            sessions_reset: self.sessions_reset.load(Ordering::Relaxed),
            analyses_requested: self.analyses_requested.load(Ordering::Relaxed),
            analyses_failed: self.analyses_failed.load(Ordering::Relaxed),
            exports_written: self.exports_written.load(Ordering::Relaxed),
            clock_anomalies: self.clock_anomalies.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Capture Statistics:\n\
             - Keys captured: {}\n\
             - Keys dropped: {}\n\
             - Session resets: {}\n\
             - Analyses requested: {} ({} failed)\n\
             - Exports written: {}\n\
             - Clock anomalies: {}\n\
             - Uptime: {} seconds",
            stats.keys_captured,
            stats.keys_dropped,
            stats.sessions_reset,
            stats.analyses_requested,
            stats.analyses_failed,
            stats.exports_written,
            stats.clock_anomalies,
            stats.uptime_secs
        )
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub keys_captured: u64,
    pub keys_dropped: u64,
    pub sessions_reset: u64,
    pub analyses_requested: u64,
    pub analyses_failed: u64,
    pub exports_written: u64,
    pub clock_anomalies: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}
