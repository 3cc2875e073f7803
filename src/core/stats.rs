//! Session statistics computed from a log snapshot.
//!
//! Statistics are never cached; every call recomputes them from the
//! snapshot it is given. Degenerate inputs (empty log, zero elapsed time)
//! produce zeros rather than errors.

use crate::collector::types::{KeyEntry, KeyType};
use crate::core::session::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Symbols per "word" for words-per-minute.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Entries per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub alpha: usize,
    pub numeric: usize,
    pub special: usize,
    pub command: usize,
}

impl TypeCounts {
    pub fn get(&self, key_type: KeyType) -> usize {
        match key_type {
            KeyType::Alpha => self.alpha,
            KeyType::Numeric => self.numeric,
            KeyType::Special => self.special,
            KeyType::Command => self.command,
        }
    }

    fn bump(&mut self, key_type: KeyType) {
        match key_type {
            KeyType::Alpha => self.alpha += 1,
            KeyType::Numeric => self.numeric += 1,
            KeyType::Special => self.special += 1,
            KeyType::Command => self.command += 1,
        }
    }
}

/// Derived session metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_keys: usize,
    /// Words per minute, one word being five captured keys of any type
    pub wpm: u64,
    /// No error signal exists in the captured stream, so this stays `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Rounded mean interval in milliseconds
    pub average_interval: u64,
    /// Population standard deviation of intervals in milliseconds
    pub interval_std_dev: f64,
    pub start_time: DateTime<Utc>,
    pub type_counts: TypeCounts,
}

/// Compute statistics for a snapshot.
pub fn compute_stats(snapshot: &Snapshot) -> SessionStats {
    let entries = snapshot.entries();
    let intervals: Vec<f64> = entries.iter().map(|e| e.interval() as f64).collect();

    let mut type_counts = TypeCounts::default();
    for entry in entries {
        type_counts.bump(entry.key_type());
    }

    SessionStats {
        total_keys: entries.len(),
        wpm: words_per_minute(entries),
        accuracy: None,
        average_interval: average_interval(&intervals),
        interval_std_dev: std_dev(&intervals),
        start_time: entries
            .first()
            .map(KeyEntry::timestamp)
            .unwrap_or_else(|| snapshot.started_at()),
        type_counts,
    }
}

/// Words per minute over the span from the first to the last entry.
fn words_per_minute(entries: &[KeyEntry]) -> u64 {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return 0;
    };

    let elapsed_minutes = (last.timestamp() - first.timestamp()).num_milliseconds() as f64 / 60_000.0;
    if elapsed_minutes <= 0.0 {
        return 0;
    }

    let words = entries.len() as f64 / CHARS_PER_WORD;
    (words / elapsed_minutes).round() as u64
}

fn average_interval(intervals: &[f64]) -> u64 {
    if intervals.is_empty() {
        return 0;
    }
    intervals.mean().round() as u64
}

fn std_dev(intervals: &[f64]) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }
    intervals.population_std_dev()
}
