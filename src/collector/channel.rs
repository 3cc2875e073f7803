//! Channel-backed key collector with an armed/paused gate.
//!
//! Key sources push events through a [`CollectorHandle`]; the capture loop
//! drains them from [`Collector::receiver`]. While the collector is paused,
//! submitted events are dropped before they reach the queue, so the session
//! log only ever sees armed periods.

use crate::collector::types::RawKeyEvent;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Configuration for the collector queue.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum number of queued, not yet recorded events
    pub queue_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
        }
    }
}

/// Errors that can occur during event collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
}

/// Producer side of a collector. Cheap to clone and safe to move to a key
/// source thread.
#[derive(Debug, Clone)]
pub struct CollectorHandle {
    sender: Sender<RawKeyEvent>,
    running: Arc<AtomicBool>,
}

impl CollectorHandle {
    /// Offer an event to the collector.
    ///
    /// Returns `false` when the event was dropped, either because capture is
    /// paused or because the queue is full. Never blocks.
    pub fn submit(&self, event: RawKeyEvent) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            tracing::trace!(key = %event.key, "dropping key while paused");
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(key = %event.key, "collector queue full, dropping key");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Whether capture is currently armed.
    pub fn is_armed(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Collector owning the event queue and the armed flag.
pub struct Collector {
    handle: CollectorHandle,
    receiver: Receiver<RawKeyEvent>,
}

impl Collector {
    /// Create a new, paused collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity.max(1));
        Self {
            handle: CollectorHandle {
                sender,
                running: Arc::new(AtomicBool::new(false)),
            },
            receiver,
        }
    }

    /// Arm the collector so submitted events are queued.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.handle.running.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        tracing::info!("capture armed");
        Ok(())
    }

    /// Pause the collector. Events submitted from now on are dropped.
    pub fn stop(&mut self) {
        if self.handle.running.swap(false, Ordering::SeqCst) {
            tracing::info!("capture paused");
        }
    }

    /// Check if the collector is currently armed.
    pub fn is_running(&self) -> bool {
        self.handle.is_armed()
    }

    /// Get a producer handle for a key source.
    pub fn handle(&self) -> CollectorHandle {
        self.handle.clone()
    }

    /// Submit an event directly through the collector's own handle.
    pub fn submit(&self, event: RawKeyEvent) -> bool {
        self.handle.submit(event)
    }

    /// Get the receiver for key events.
    pub fn receiver(&self) -> &Receiver<RawKeyEvent> {
        &self.receiver
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<RawKeyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drop every event still waiting in the queue. Returns how many were
    /// discarded.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_collector_is_paused() {
        let collector = Collector::new(CollectorConfig::default());
        assert!(!collector.is_running());
        assert!(!collector.submit(RawKeyEvent::new("a", "KeyA")));
        assert!(collector.try_recv().is_none());
    }

    #[test]
    fn test_armed_collector_queues_events() {
        let mut collector = Collector::new(CollectorConfig::default());
        collector.start().unwrap();
        assert!(collector.submit(RawKeyEvent::new("a", "KeyA")));

        let event = collector.try_recv().unwrap();
        assert_eq!(event.key, "a");
    }

    #[test]
    fn test_start_twice_fails() {
        let mut collector = Collector::new(CollectorConfig::default());
        collector.start().unwrap();
        assert_eq!(collector.start(), Err(CollectorError::AlreadyRunning));
    }

    #[test]
    fn test_pause_gates_handles() {
        let mut collector = Collector::new(CollectorConfig::default());
        let handle = collector.handle();
        collector.start().unwrap();
        assert!(handle.submit(RawKeyEvent::new("1", "Digit1")));

        collector.stop();
        assert!(!handle.is_armed());
        assert!(!handle.submit(RawKeyEvent::new("2", "Digit2")));
        assert_eq!(collector.drain(), 1);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let mut collector = Collector::new(CollectorConfig { queue_capacity: 1 });
        collector.start().unwrap();
        assert!(collector.submit(RawKeyEvent::new("a", "KeyA")));
        assert!(!collector.submit(RawKeyEvent::new("b", "KeyB")));
    }
}
