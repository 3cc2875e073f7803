//! Key event collection.
//!
//! This module provides the raw event and entry types, the armed/paused
//! collector queue, and a terminal key source.

pub mod channel;
pub mod terminal;
pub mod types;

// Re-export commonly used types
pub use channel::{Collector, CollectorConfig, CollectorError, CollectorHandle};
pub use terminal::{ControlCommand, TerminalInput, TerminalKeySource};
pub use types::{KeyEntry, KeyType, RawKeyEvent};
