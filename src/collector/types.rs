//! Event and entry types shared by the collector and the capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw key press as delivered by a key source.
///
/// `key` is the logical symbol ("a", "$", "Enter") and `code` the physical
/// key position ("KeyA", "Digit4", "Enter").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    pub key: String,
    pub code: String,
    pub timestamp: DateTime<Utc>,
}

impl RawKeyEvent {
    /// Create an event stamped with the current time.
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self::at(key, code, Utc::now())
    }

    /// Create an event with an explicit timestamp.
    pub fn at(key: impl Into<String>, code: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            timestamp,
        }
    }
}

/// Category assigned to a captured key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// A single Latin letter
    Alpha,
    /// A single decimal digit
    Numeric,
    /// Any other single-character symbol (punctuation, space)
    Special,
    /// A named key such as "Shift" or "ArrowLeft"
    Command,
}

impl KeyType {
    pub const ALL: [KeyType; 4] = [
        KeyType::Alpha,
        KeyType::Numeric,
        KeyType::Special,
        KeyType::Command,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Alpha => "alpha",
            KeyType::Numeric => "numeric",
            KeyType::Special => "special",
            KeyType::Command => "command",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, timed key record.
///
/// Entries are immutable once built; fields are only reachable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEntry {
    id: Uuid,
    key: String,
    code: String,
    timestamp: DateTime<Utc>,
    /// Milliseconds since the previous entry (or since capture start)
    interval: u64,
    #[serde(rename = "type")]
    key_type: KeyType,
}

impl KeyEntry {
    pub(crate) fn new(
        key: String,
        code: String,
        timestamp: DateTime<Utc>,
        interval: u64,
        key_type: KeyType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            code,
            timestamp,
            interval,
            key_type,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}
