//! Append-only session log and read snapshots.

use crate::collector::types::KeyEntry;
use chrono::{DateTime, Utc};
use std::ops::Deref;
use std::sync::Arc;

/// Immutable view of the session log taken at a single instant.
///
/// Cloning a snapshot is cheap; it never changes after it has been taken.
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Arc<[KeyEntry]>,
    started_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(entries: Vec<KeyEntry>, started_at: DateTime<Utc>) -> Self {
        Self {
            entries: entries.into(),
            started_at,
        }
    }

    /// Capture start time of the session the snapshot was taken from.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }
}

impl Deref for Snapshot {
    type Target = [KeyEntry];

    fn deref(&self) -> &[KeyEntry] {
        &self.entries
    }
}

/// Insertion-ordered log of captured entries.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Vec<KeyEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the end of the log and return it.
    pub fn append(&mut self, entry: KeyEntry) -> &KeyEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Copy the current contents into an immutable snapshot.
    pub fn snapshot(&self, started_at: DateTime<Utc>) -> Snapshot {
        Snapshot::new(self.entries.clone(), started_at)
    }

    /// Discard every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::KeyType;

    fn entry(key: &str) -> KeyEntry {
        KeyEntry::new(key.into(), "".into(), Utc::now(), 0, KeyType::Alpha)
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = SessionLog::new();
        for key in ["a", "b", "c"] {
            log.append(entry(key));
        }
        let snapshot = log.snapshot(Utc::now());
        let keys: Vec<&str> = snapshot.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_appends() {
        let mut log = SessionLog::new();
        log.append(entry("a"));
        let snapshot = log.snapshot(Utc::now());

        log.append(entry("b"));
        log.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key(), "a");
        assert!(log.is_empty());
    }
}
