//! Single-request analysis slot.
//!
//! At most one request is in flight at a time, including one whose result
//! was already discarded by a clear. The request runs on its own worker
//! thread so capture is never blocked, and its outcome is stored as an
//! [`AnalysisState`]. Failures, panics included, are never retried.

use crate::analysis::{AnalysisError, AnalysisRequest, Analyzer, FAILURE_MESSAGE};
use crate::core::features::FeaturePayload;
use crate::transparency::SharedTransparencyLog;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Outcome of the most recent analysis request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnalysisState {
    #[default]
    Idle,
    InFlight,
    Ready(String),
    Failed(String),
}

impl AnalysisState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, AnalysisState::InFlight)
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AnalysisState,
    /// Bumped on every clear so results of discarded requests are ignored
    generation: u64,
    /// A worker is running, whether or not its result is still wanted
    outstanding: bool,
}

/// Holder for the current analysis request and its result.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSlot {
    inner: Arc<Mutex<Inner>>,
    transparency: Option<SharedTransparencyLog>,
}

impl AnalysisSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record request and failure counts in a transparency log.
    pub fn with_transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.transparency = Some(log);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    pub fn state(&self) -> AnalysisState {
        self.lock().state.clone()
    }

    /// Start an analysis request on a worker thread.
    ///
    /// Fails with [`AnalysisError::AlreadyInFlight`] if a previous request
    /// has not resolved yet.
    pub fn begin(
        &self,
        payload: FeaturePayload,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<JoinHandle<()>, AnalysisError> {
        let generation = {
            let mut inner = self.lock();
            if inner.outstanding {
                return Err(AnalysisError::AlreadyInFlight);
            }
            inner.outstanding = true;
            inner.state = AnalysisState::InFlight;
            inner.generation
        };

        if let Some(log) = &self.transparency {
            log.record_analysis_requested();
        }
        tracing::info!(
            keys = payload.sequence.chars().count(),
            timings = payload.timings.len(),
            "analysis requested"
        );

        let slot = self.clone();
        let request = AnalysisRequest::new(payload);
        let handle = std::thread::spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&request)))
                .unwrap_or_else(|cause| Err(AnalysisError::Panicked(panic_message(&*cause))));
            slot.resolve(generation, result);
        });
        Ok(handle)
    }

    fn resolve(&self, generation: u64, result: Result<String, AnalysisError>) {
        let state = match result {
            Ok(text) => AnalysisState::Ready(text),
            Err(e) => {
                tracing::error!("analysis failed: {e}");
                if let Some(log) = &self.transparency {
                    log.record_analysis_failed();
                }
                AnalysisState::Failed(FAILURE_MESSAGE.to_string())
            }
        };

        let mut inner = self.lock();
        inner.outstanding = false;
        if inner.generation != generation {
            tracing::debug!("discarding analysis result for a cleared session");
            return;
        }
        inner.state = state;
    }

    /// Drop any held result. A request still in flight is not cancelled; its
    /// result is discarded when it arrives and no new request may start
    /// until then.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = AnalysisState::Idle;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn payload() -> FeaturePayload {
        FeaturePayload {
            sequence: "hello".to_string(),
            timings: vec![0, 100, 110, 90, 120],
        }
    }

    #[test]
    fn test_successful_analysis() {
        let slot = AnalysisSlot::new();
        let analyzer: Arc<dyn Analyzer> =
            Arc::new(|_: &AnalysisRequest| -> Result<String, AnalysisError> { Ok("steady".into()) });

        slot.begin(payload(), analyzer).unwrap().join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Ready("steady".to_string()));
    }

    #[test]
    fn test_failure_becomes_message() {
        let log = crate::transparency::create_shared_log();
        let slot = AnalysisSlot::new().with_transparency(log.clone());
        let analyzer: Arc<dyn Analyzer> = Arc::new(|_: &AnalysisRequest| -> Result<String, AnalysisError> {
            Err(AnalysisError::Network("timed out".into()))
        });

        slot.begin(payload(), analyzer).unwrap().join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Failed(FAILURE_MESSAGE.to_string()));

        let stats = log.stats();
        assert_eq!(stats.analyses_requested, 1);
        assert_eq!(stats.analyses_failed, 1);
    }

    #[test]
    fn test_only_one_request_in_flight() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let slot = AnalysisSlot::new();
        let analyzer: Arc<dyn Analyzer> = Arc::new(move |_: &AnalysisRequest| -> Result<String, AnalysisError> {
            let _ = release_rx.recv();
            Ok("done".into())
        });

        let handle = slot.begin(payload(), analyzer.clone()).unwrap();
        assert!(slot.state().is_in_flight());
        assert!(matches!(
            slot.begin(payload(), analyzer.clone()),
            Err(AnalysisError::AlreadyInFlight)
        ));

        release_tx.send(()).unwrap();
        handle.join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Ready("done".to_string()));

        // A fresh request is allowed once the previous one resolved
        drop(release_tx);
        slot.begin(payload(), analyzer).unwrap().join().unwrap();
    }

    #[test]
    fn test_clear_discards_late_result() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let slot = AnalysisSlot::new();
        let analyzer: Arc<dyn Analyzer> = Arc::new(move |_: &AnalysisRequest| -> Result<String, AnalysisError> {
            let _ = release_rx.recv();
            Ok("stale".into())
        });

        let handle = slot.begin(payload(), analyzer).unwrap();
        slot.clear();
        release_tx.send(()).unwrap();
        handle.join().unwrap();

        assert_eq!(slot.state(), AnalysisState::Idle);
    }

    #[test]
    fn test_clear_keeps_worker_outstanding() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let slot = AnalysisSlot::new();
        let analyzer: Arc<dyn Analyzer> = Arc::new(move |_: &AnalysisRequest| -> Result<String, AnalysisError> {
            let _ = release_rx.recv();
            Ok("first".into())
        });

        let handle = slot.begin(payload(), analyzer.clone()).unwrap();
        slot.clear();
        assert_eq!(slot.state(), AnalysisState::Idle);
        assert!(slot.lock().outstanding);
        assert!(matches!(
            slot.begin(payload(), analyzer.clone()),
            Err(AnalysisError::AlreadyInFlight)
        ));

        release_tx.send(()).unwrap();
        handle.join().unwrap();
        assert!(!slot.lock().outstanding);
        assert_eq!(slot.state(), AnalysisState::Idle);

        drop(release_tx);
        slot.begin(payload(), analyzer).unwrap().join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Ready("first".to_string()));
    }

    #[test]
    fn test_panicking_analyzer_becomes_failure() {
        let log = crate::transparency::create_shared_log();
        let slot = AnalysisSlot::new().with_transparency(log.clone());
        let analyzer: Arc<dyn Analyzer> = Arc::new(|_: &AnalysisRequest| -> Result<String, AnalysisError> {
            panic!("service exploded")
        });

        slot.begin(payload(), analyzer).unwrap().join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Failed(FAILURE_MESSAGE.to_string()));
        assert!(!slot.lock().outstanding);
        assert_eq!(log.stats().analyses_failed, 1);

        // The slot accepts a new request afterwards
        let analyzer: Arc<dyn Analyzer> =
            Arc::new(|_: &AnalysisRequest| -> Result<String, AnalysisError> { Ok("recovered".into()) });
        slot.begin(payload(), analyzer).unwrap().join().unwrap();
        assert_eq!(slot.state(), AnalysisState::Ready("recovered".to_string()));
    }
}
