//! Integration tests for the capture pipeline

use chrono::{DateTime, TimeZone, Utc};
use keystroke_insight::analysis::{AnalysisError, AnalysisRequest, AnalysisState, Analyzer};
use keystroke_insight::collector::{Collector, CollectorConfig, KeyType, RawKeyEvent};
use keystroke_insight::core::{AnalyzeError, CaptureSession, SharedCaptureSession, MAX_TIMINGS};
use keystroke_insight::export;
use keystroke_insight::transparency::create_shared_log;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn ms(t: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(t).unwrap()
}

fn code_for(key: &str) -> String {
    match key.chars().next() {
        Some(c) if key.len() == 1 && c.is_ascii_alphabetic() => {
            format!("Key{}", c.to_ascii_uppercase())
        }
        Some(c) if key.len() == 1 && c.is_ascii_digit() => format!("Digit{c}"),
        _ => key.to_string(),
    }
}

/// Drain everything the collector queued into the session.
fn pump(collector: &Collector, session: &SharedCaptureSession) {
    for raw in collector.receiver().try_iter() {
        session.record(raw);
    }
}

#[test]
fn test_collector_to_stats() {
    let mut collector = Collector::new(CollectorConfig::default());
    let session = SharedCaptureSession::new(CaptureSession::new(ms(1_000)));
    collector.start().unwrap();

    let handle = collector.handle();
    for (key, at) in [("a", 1_000), ("b", 1_300), ("c", 1_900)] {
        assert!(handle.submit(RawKeyEvent::at(key, code_for(key), ms(at))));
    }
    pump(&collector, &session);

    let snapshot = session.snapshot();
    let intervals: Vec<u64> = snapshot.iter().map(|e| e.interval()).collect();
    assert_eq!(intervals, vec![0, 300, 600]);

    let stats = session.read().stats();
    assert_eq!(stats.total_keys, 3);
    assert_eq!(stats.average_interval, 300);
}

#[test]
fn test_paused_keys_leave_an_invisible_gap() {
    let mut collector = Collector::new(CollectorConfig::default());
    let session = SharedCaptureSession::new(CaptureSession::new(ms(0)));
    let handle = collector.handle();

    collector.start().unwrap();
    handle.submit(RawKeyEvent::at("a", "KeyA", ms(100)));
    pump(&collector, &session);

    collector.stop();
    assert!(!handle.submit(RawKeyEvent::at("b", "KeyB", ms(200))));
    assert!(!handle.submit(RawKeyEvent::at("c", "KeyC", ms(300))));

    collector.start().unwrap();
    handle.submit(RawKeyEvent::at("d", "KeyD", ms(5_100)));
    pump(&collector, &session);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[1].key(), "d");
    // The pause shows up as one long interval
    assert_eq!(snapshot[1].interval(), 5_000);
    assert_eq!(session.read().stats().average_interval, 2_550);
}

#[test]
fn test_classification_through_pipeline() {
    let mut session = CaptureSession::new(ms(0));
    for (i, key) in ["Q", "7", "$", "Enter", " "].iter().enumerate() {
        session.record(RawKeyEvent::at(*key, code_for(key), ms(i as i64 * 10)));
    }

    let types: Vec<KeyType> = session.snapshot().iter().map(|e| e.key_type()).collect();
    assert_eq!(
        types,
        vec![
            KeyType::Alpha,
            KeyType::Numeric,
            KeyType::Special,
            KeyType::Command,
            KeyType::Special
        ]
    );
}

#[test]
fn test_features_are_bounded_for_long_sessions() {
    let mut session = CaptureSession::new(ms(0));
    for i in 0..500 {
        session.record(RawKeyEvent::at("x", "KeyX", ms(i * 100)));
    }

    let payload = session.features().unwrap();
    assert_eq!(payload.timings.len(), MAX_TIMINGS);
    assert_eq!(payload.sequence.len(), 500);
    assert!(payload.timings.iter().skip(1).all(|&t| t == 100));
}

#[test]
fn test_analyzer_receives_exact_payload() {
    let mut session = CaptureSession::new(ms(0));
    for (i, key) in "hello world".chars().enumerate() {
        let key = key.to_string();
        let code = code_for(&key);
        session.record(RawKeyEvent::at(key, code, ms(i as i64 * 120)));
    }
    let expected = session.features().unwrap();

    let seen = Arc::new(std::sync::Mutex::new(None));
    let analyzer: Arc<dyn Analyzer> = {
        let seen = seen.clone();
        Arc::new(move |req: &AnalysisRequest| -> Result<String, AnalysisError> {
            *seen.lock().unwrap() = Some(req.payload.clone());
            Ok("Even rhythm.".to_string())
        })
    };

    session.request_analysis(analyzer).unwrap().join().unwrap();
    assert_eq!(seen.lock().unwrap().as_ref(), Some(&expected));
    assert_eq!(
        session.analysis_state(),
        AnalysisState::Ready("Even rhythm.".to_string())
    );
}

#[test]
fn test_analysis_never_called_below_threshold() {
    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer: Arc<dyn Analyzer> = {
        let calls = calls.clone();
        Arc::new(move |_: &AnalysisRequest| -> Result<String, AnalysisError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        })
    };

    let mut session = CaptureSession::new(ms(0));
    for i in 0..4 {
        session.record(RawKeyEvent::at("a", "KeyA", ms(i * 50)));
        assert!(matches!(
            session.request_analysis(analyzer.clone()),
            Err(AnalyzeError::NotEnoughData(_))
        ));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    session.record(RawKeyEvent::at("a", "KeyA", ms(250)));
    session.request_analysis(analyzer).unwrap().join().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_analysis_leaves_session_usable() {
    let log = create_shared_log();
    let mut session = CaptureSession::new(ms(0)).with_transparency(log.clone());
    for i in 0..6 {
        session.record(RawKeyEvent::at("k", "KeyK", ms(i * 200)));
    }
    let analyzer: Arc<dyn Analyzer> =
        Arc::new(|_: &AnalysisRequest| -> Result<String, AnalysisError> {
            Err(AnalysisError::Server {
                status: 503,
                message: "unavailable".to_string(),
            })
        });

    session.request_analysis(analyzer).unwrap().join().unwrap();
    assert!(matches!(session.analysis_state(), AnalysisState::Failed(_)));

    // Capture continues and statistics are unaffected
    session.record(RawKeyEvent::at("k", "KeyK", ms(1_400)));
    let stats = session.stats();
    assert_eq!(stats.total_keys, 7);
    assert_eq!(stats.average_interval, 200);

    let audit = log.stats();
    assert_eq!(audit.analyses_requested, 1);
    assert_eq!(audit.analyses_failed, 1);
    assert_eq!(audit.keys_captured, 7);
}

#[test]
fn test_export_after_replay() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = CaptureSession::new(ms(1_000));
    session.record(RawKeyEvent::at("h", "KeyH", ms(1_250)));
    session.record(RawKeyEvent::at("i", "KeyI", ms(1_400)));

    let path = export::write_text(&session.snapshot(), dir.path(), ms(1_000)).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "keystrokes_19700101_000001.txt"
    );

    let content = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[1970-01-01T00:00:01.250Z] h (KeyH) 250ms",
            "[1970-01-01T00:00:01.400Z] i (KeyI) 150ms",
        ]
    );
}
