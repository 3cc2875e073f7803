//! Capture session: one tracker, one log, one analysis slot.
//!
//! The session is the only writer of its log. Readers take a [`Snapshot`]
//! and compute from it without holding any lock on the session.

use crate::analysis::{AnalysisError, AnalysisSlot, AnalysisState, Analyzer};
use crate::collector::types::{KeyEntry, RawKeyEvent};
use crate::core::entry::build_entry;
use crate::core::features::{self, FeaturePayload, NotEnoughData};
use crate::core::interval::IntervalTracker;
use crate::core::session::{SessionLog, Snapshot};
use crate::core::stats::{compute_stats, SessionStats};
use crate::transparency::SharedTransparencyLog;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;
use thiserror::Error;

/// Why an analysis could not be started.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    NotEnoughData(#[from] NotEnoughData),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// The state of one capture session.
#[derive(Debug)]
pub struct CaptureSession {
    tracker: IntervalTracker,
    log: SessionLog,
    analysis: AnalysisSlot,
    transparency: Option<SharedTransparencyLog>,
}

impl CaptureSession {
    /// Start a session whose first interval is measured from `started_at`.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            tracker: IntervalTracker::new(started_at),
            log: SessionLog::new(),
            analysis: AnalysisSlot::new(),
            transparency: None,
        }
    }

    /// Report capture activity to a transparency log.
    pub fn with_transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.analysis = self.analysis.with_transparency(log.clone());
        self.transparency = Some(log);
        self
    }

    /// Enrich a raw event and append it to the log.
    pub fn record(&mut self, raw: RawKeyEvent) -> &KeyEntry {
        let anomalies_before = self.tracker.anomalies();
        let entry = build_entry(raw, &mut self.tracker);

        if let Some(log) = &self.transparency {
            log.record_key_captured();
            if self.tracker.anomalies() > anomalies_before {
                log.record_clock_anomaly();
            }
        }

        self.log.append(entry)
    }

    /// Immutable view of the log at this instant.
    pub fn snapshot(&self) -> Snapshot {
        self.log.snapshot(self.tracker.started_at())
    }

    pub fn stats(&self) -> SessionStats {
        compute_stats(&self.snapshot())
    }

    /// Feature payload, or why there is not enough data for one.
    pub fn features(&self) -> Result<FeaturePayload, NotEnoughData> {
        features::prepare(&self.snapshot())
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.tracker.started_at()
    }

    /// Clock anomalies seen since the session started.
    pub fn clock_anomalies(&self) -> u64 {
        self.tracker.anomalies()
    }

    /// Discard all entries and any held analysis result, and restart interval
    /// measurement at `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        let discarded = self.log.len();
        self.log.clear();
        self.tracker.reset(now);
        self.analysis.clear();

        if let Some(log) = &self.transparency {
            log.record_session_reset();
        }
        tracing::info!(discarded, "session reset");
    }

    /// Note that capture was armed at `now`. A session with no entries yet
    /// measures its first interval from here, so time spent paused before
    /// the first key is not counted. Later pauses stay in the next interval.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        if self.log.is_empty() {
            self.tracker.reset(now);
        }
    }

    /// Start an analysis of the current log on a worker thread.
    ///
    /// Requires at least [`features::MIN_ENTRIES_FOR_ANALYSIS`] entries and no
    /// other request in flight.
    pub fn request_analysis(
        &self,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<JoinHandle<()>, AnalyzeError> {
        let payload = self.features()?;
        Ok(self.analysis.begin(payload, analyzer)?)
    }

    pub fn analysis_state(&self) -> AnalysisState {
        self.analysis.state()
    }
}

/// A capture session shared between the capture thread and readers.
#[derive(Debug, Clone)]
pub struct SharedCaptureSession(Arc<RwLock<CaptureSession>>);

impl SharedCaptureSession {
    pub fn new(session: CaptureSession) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, CaptureSession> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, CaptureSession> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one event under a short write lock.
    pub fn record(&self, raw: RawKeyEvent) -> KeyEntry {
        self.write().record(raw).clone()
    }

    /// Take a snapshot under a short read lock.
    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }
}
