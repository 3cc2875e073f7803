//! Feature extraction for the remote analysis call.
//!
//! Reduces a session snapshot to the payload handed to the analyzer: the
//! full key sequence and the intervals of the first entries only.

use crate::collector::types::KeyEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of intervals sent for analysis.
pub const MAX_TIMINGS: usize = 50;

/// Minimum number of entries before analysis may be requested.
pub const MIN_ENTRIES_FOR_ANALYSIS: usize = 5;

/// Bounded summary of a session for external analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePayload {
    /// Every captured key concatenated in order, no separator
    pub sequence: String,
    /// Intervals (ms) of the first [`MAX_TIMINGS`] entries
    pub timings: Vec<u64>,
}

/// Returned when the session is too short to analyse.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Not enough data: {have} keys captured, at least {need} needed")]
pub struct NotEnoughData {
    pub have: usize,
    pub need: usize,
}

/// Build the feature payload from a list of entries.
pub fn extract(entries: &[KeyEntry]) -> FeaturePayload {
    FeaturePayload {
        sequence: entries.iter().map(KeyEntry::key).collect(),
        timings: entries
            .iter()
            .take(MAX_TIMINGS)
            .map(KeyEntry::interval)
            .collect(),
    }
}

/// Build the payload only if the session has enough entries for analysis.
pub fn prepare(entries: &[KeyEntry]) -> Result<FeaturePayload, NotEnoughData> {
    if entries.len() < MIN_ENTRIES_FOR_ANALYSIS {
        return Err(NotEnoughData {
            have: entries.len(),
            need: MIN_ENTRIES_FOR_ANALYSIS,
        });
    }
    Ok(extract(entries))
}
