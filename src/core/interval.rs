//! Inter-key interval tracking.

use chrono::{DateTime, Utc};

/// Tracks the time of the previous key and computes the delta for the next.
///
/// One tracker belongs to one capture session. `record` takes `&mut self`, so
/// a session can only have a single writer.
#[derive(Debug, Clone)]
pub struct IntervalTracker {
    started_at: DateTime<Utc>,
    last_event_time: DateTime<Utc>,
    anomalies: u64,
}

/// Result of recording one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Time to store on the entry. Equal to the event time unless the clock
    /// went backwards, in which case it is the previous event's time.
    pub at: DateTime<Utc>,
    /// Milliseconds since the previous event (or capture start)
    pub delta_ms: u64,
    /// Set when the event time preceded the previous event
    pub clamped: bool,
}

impl IntervalTracker {
    /// Create a tracker whose first delta is measured from `started_at`.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            last_event_time: started_at,
            anomalies: 0,
        }
    }

    /// Compute the delta since the previous event and advance.
    pub fn record_and_delta(&mut self, now: DateTime<Utc>) -> u64 {
        self.record(now).delta_ms
    }

    /// Like [`record_and_delta`](Self::record_and_delta), but also returns
    /// the effective time and whether it was clamped.
    pub fn record(&mut self, now: DateTime<Utc>) -> Tick {
        let delta = (now - self.last_event_time).num_milliseconds();
        if delta < 0 {
            self.anomalies += 1;
            tracing::warn!(
                delta_ms = delta,
                previous = %self.last_event_time,
                "non-monotonic key timestamp, clamping interval to 0"
            );
            return Tick {
                at: self.last_event_time,
                delta_ms: 0,
                clamped: true,
            };
        }

        self.last_event_time = now;
        Tick {
            at: now,
            delta_ms: delta as u64,
            clamped: false,
        }
    }

    /// Restart the tracker at a new capture start.
    pub fn reset(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
        self.last_event_time = started_at;
        self.anomalies = 0;
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_event_time(&self) -> DateTime<Utc> {
        self.last_event_time
    }

    /// Number of clamped events since the last reset.
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }
}
