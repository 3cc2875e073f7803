//! Entry construction from raw events.

use crate::collector::types::{KeyEntry, RawKeyEvent};
use crate::core::classifier::classify;
use crate::core::interval::IntervalTracker;

/// Build an immutable entry from a raw event.
///
/// Advances `tracker` exactly once. If the event's timestamp went backwards,
/// the entry carries the previous event's time and a zero interval.
pub fn build_entry(raw: RawKeyEvent, tracker: &mut IntervalTracker) -> KeyEntry {
    let tick = tracker.record(raw.timestamp);
    let key_type = classify(&raw.key, &raw.code);

    tracing::debug!(
        key = %raw.key,
        code = %raw.code,
        interval_ms = tick.delta_ms,
        key_type = %key_type,
        "key captured"
    );

    KeyEntry::new(raw.key, raw.code, tick.at, tick.delta_ms, key_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::KeyType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_build_populates_all_fields() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let at = Utc.timestamp_millis_opt(1_300).unwrap();
        let mut tracker = IntervalTracker::new(start);

        let entry = build_entry(RawKeyEvent::at("Enter", "Enter", at), &mut tracker);

        assert_eq!(entry.key(), "Enter");
        assert_eq!(entry.code(), "Enter");
        assert_eq!(entry.timestamp(), at);
        assert_eq!(entry.interval(), 300);
        assert_eq!(entry.key_type(), KeyType::Command);
        assert_eq!(tracker.last_event_time(), at);
    }

    #[test]
    fn test_backwards_event_keeps_order() {
        let start = Utc.timestamp_millis_opt(0).unwrap();
        let mut tracker = IntervalTracker::new(start);

        let first = build_entry(
            RawKeyEvent::at("a", "KeyA", Utc.timestamp_millis_opt(500).unwrap()),
            &mut tracker,
        );
        let second = build_entry(
            RawKeyEvent::at("b", "KeyB", Utc.timestamp_millis_opt(400).unwrap()),
            &mut tracker,
        );

        assert_eq!(second.timestamp(), first.timestamp());
        assert_eq!(second.interval(), 0);
    }
}
