//! Keystroke Insight CLI
//!
//! Captures key presses in the terminal and reports session analytics.

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use keystroke_insight::{
    analysis::{AnalysisError, AnalysisState, Analyzer},
    collector::{
        Collector, CollectorConfig, ControlCommand, KeyType, RawKeyEvent, TerminalInput,
        TerminalKeySource,
    },
    config::{AnalysisConfig, Config},
    core::{AnalyzeError, CaptureSession, SessionStats, SharedCaptureSession},
    export::{self, JsonFormat},
    transparency::{create_shared_log, SharedTransparencyLog},
    CAPTURE_NOTICE, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystroke-insight")]
#[command(version = VERSION)]
#[command(about = "Keystroke capture and session analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture key presses in this terminal
    Capture {
        /// Start with capture paused
        #[arg(long)]
        paused: bool,
    },

    /// Rebuild a session from a JSON Lines file of raw key events
    Replay {
        /// Input file, one raw key event per line
        file: PathBuf,

        /// Capture start time in epoch milliseconds (defaults to the first event)
        #[arg(long)]
        started_at: Option<i64>,

        /// Write a text export into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the enriched entries as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Use JSON Lines instead of a pretty array for --json
        #[arg(long)]
        jsonl: bool,

        /// Send the session to the analysis service
        #[arg(long)]
        analyze: bool,
    },

    /// Pause a running capture
    Pause,

    /// Resume a paused capture
    Resume,

    /// Display the capture notice
    Notice,

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { paused } => {
            init_logging("keystroke_insight=warn");
            cmd_capture(paused)
        }
        Commands::Replay {
            file,
            started_at,
            export,
            json,
            jsonl,
            analyze,
        } => {
            init_logging("keystroke_insight=info");
            cmd_replay(&file, started_at, export, json, jsonl, analyze)
        }
        Commands::Pause => cmd_set_paused(true),
        Commands::Resume => cmd_set_paused(false),
        Commands::Notice => {
            println!("{CAPTURE_NOTICE}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default.
fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Restores cooked mode when capture ends, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Print a line that renders correctly in raw mode.
macro_rules! say {
    ($($arg:tt)*) => {
        print!("{}\r\n", format!($($arg)*))
    };
}

fn cmd_capture(start_paused: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Keystroke Insight v{VERSION}");
    println!("{CAPTURE_NOTICE}");

    let transparency = create_shared_log();
    let session = SharedCaptureSession::new(
        CaptureSession::new(Utc::now()).with_transparency(transparency.clone()),
    );
    let mut collector = Collector::new(CollectorConfig {
        queue_capacity: config.queue_capacity,
    });
    let key_handle = collector.handle();
    let analyzer = build_analyzer(&config.analysis);

    let mut paused = start_paused || config.paused;
    if paused {
        println!("Capture is paused. Press Ctrl+P or run `keystroke-insight resume`.");
    } else {
        collector.start()?;
        session.write().arm(Utc::now());
    }

    let guard = RawModeGuard::enable()?;
    let source = TerminalKeySource::new();
    let mut last_config_check = Instant::now();
    let mut config_paused = config.paused;
    let mut last_analysis = AnalysisState::Idle;

    loop {
        // Let `keystroke-insight pause/resume` control a running capture.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.paused != config_paused {
                    config_paused = cfg.paused;
                    if config_paused != paused {
                        paused = set_armed(&mut collector, &session, !config_paused, &transparency)?;
                    }
                }
            }
            last_config_check = Instant::now();
        }

        match source.recv_timeout(Duration::from_millis(100)) {
            Ok(TerminalInput::Key(raw)) => {
                if !key_handle.submit(raw) {
                    transparency.record_keys_dropped(1);
                }
            }
            Ok(TerminalInput::Command(command)) => match command {
                ControlCommand::Quit => break,
                ControlCommand::TogglePause => {
                    paused = set_armed(&mut collector, &session, paused, &transparency)?;
                }
                ControlCommand::Reset => {
                    transparency.record_keys_dropped(collector.drain() as u64);
                    session.write().reset(Utc::now());
                    last_analysis = AnalysisState::Idle;
                    say!("-- session reset --");
                }
                ControlCommand::Export => {
                    let snapshot = session.snapshot();
                    match export::write_text(&snapshot, &config.export_path, Utc::now()) {
                        Ok(path) => {
                            transparency.record_export_written();
                            say!("-- exported {} keys to {} --", snapshot.len(), path.display());
                        }
                        Err(e) => say!("-- export failed: {e} --"),
                    }
                }
                ControlCommand::Analyze => {
                    start_analysis(&session, analyzer.as_ref());
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::error!("terminal key source stopped");
                break;
            }
        }

        for raw in collector.receiver().try_iter() {
            let entry = session.record(raw);
            say!("{}  {}", export::format_line(&entry), entry.key_type());
        }

        let state = session.read().analysis_state();
        if state != last_analysis {
            report_analysis(&state);
            last_analysis = state;
        }
    }

    collector.stop();
    drop(guard);

    println!();
    print_stats(&session.read().stats());
    println!();
    println!("{}", transparency.summary());
    Ok(())
}

/// Arm or pause the collector. Returns the new paused flag.
fn set_armed(
    collector: &mut Collector,
    session: &SharedCaptureSession,
    arm: bool,
    transparency: &SharedTransparencyLog,
) -> Result<bool> {
    if arm {
        collector.start()?;
        session.write().arm(Utc::now());
        say!("-- capture resumed --");
        Ok(false)
    } else {
        collector.stop();
        transparency.record_keys_dropped(collector.drain() as u64);
        say!("-- capture paused --");
        Ok(true)
    }
}

fn start_analysis(session: &SharedCaptureSession, analyzer: Option<&Arc<dyn Analyzer>>) {
    let Some(analyzer) = analyzer else {
        say!("-- analysis unavailable: no analysis client configured --");
        return;
    };

    match session.read().request_analysis(analyzer.clone()) {
        Ok(_) => {}
        Err(AnalyzeError::NotEnoughData(e)) => say!("-- {e} --"),
        Err(AnalyzeError::Analysis(AnalysisError::AlreadyInFlight)) => {
            say!("-- analysis already in progress --")
        }
        Err(e) => say!("-- {e} --"),
    }
}

fn report_analysis(state: &AnalysisState) {
    match state {
        AnalysisState::Idle => {}
        AnalysisState::InFlight => say!("-- analysing... --"),
        AnalysisState::Ready(text) => {
            say!("-- analysis --");
            for line in text.lines() {
                say!("{line}");
            }
            say!("--");
        }
        AnalysisState::Failed(message) => say!("-- {message} --"),
    }
}

#[cfg(feature = "analysis")]
fn build_analyzer(config: &AnalysisConfig) -> Option<Arc<dyn Analyzer>> {
    match keystroke_insight::BlockingHttpAnalyzer::from_env(config.clone()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            eprintln!("Warning: Analysis disabled: {e}");
            None
        }
    }
}

#[cfg(not(feature = "analysis"))]
fn build_analyzer(_config: &AnalysisConfig) -> Option<Arc<dyn Analyzer>> {
    None
}

fn cmd_replay(
    file: &Path,
    started_at: Option<i64>,
    export_dir: Option<PathBuf>,
    json: Option<PathBuf>,
    jsonl: bool,
    analyze: bool,
) -> Result<()> {
    let events = read_events(file)?;
    let Some(first) = events.first() else {
        bail!("{} contains no key events", file.display());
    };

    let start = match started_at {
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .context("invalid --started-at timestamp")?,
        None => first.timestamp,
    };

    let transparency = create_shared_log();
    let mut session = CaptureSession::new(start).with_transparency(transparency.clone());
    for raw in events {
        session.record(raw);
    }
    tracing::info!(keys = session.len(), "session replayed");

    print_stats(&session.stats());

    let snapshot = session.snapshot();
    if let Some(dir) = export_dir {
        let path = export::write_text(&snapshot, &dir, Utc::now())?;
        transparency.record_export_written();
        println!("Exported {} keys to {:?}", snapshot.len(), path);
    }
    if let Some(path) = json {
        let format = if jsonl {
            JsonFormat::Lines
        } else {
            JsonFormat::Pretty
        };
        export::write_json(&snapshot, &path, format)?;
        transparency.record_export_written();
        println!("Wrote entries to {path:?}");
    }

    if analyze {
        let config = Config::load().unwrap_or_default();
        let Some(analyzer) = build_analyzer(&config.analysis) else {
            bail!("analysis is not available");
        };
        match session.request_analysis(analyzer) {
            Ok(handle) => {
                let _ = handle.join();
                match session.analysis_state() {
                    AnalysisState::Ready(text) => println!("\nAnalysis:\n{text}"),
                    AnalysisState::Failed(message) => println!("\n{message}"),
                    _ => {}
                }
            }
            Err(AnalyzeError::NotEnoughData(e)) => println!("\n{e}"),
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!("{}", transparency.summary());
    Ok(())
}

/// Read raw key events from a JSON Lines file. Blank lines are skipped.
fn read_events(path: &Path) -> Result<Vec<RawKeyEvent>> {
    let file = std::fs::File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let mut events = Vec::new();
    for (number, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RawKeyEvent = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid key event", path.display(), number + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn print_stats(stats: &SessionStats) {
    println!("Session Statistics");
    println!("==================");
    println!("  Keys captured: {}", stats.total_keys);
    println!("  Words per minute: {}", stats.wpm);
    println!("  Average interval: {}ms", stats.average_interval);
    println!("  Interval std dev: {:.1}ms", stats.interval_std_dev);
    println!("  Started: {}", stats.start_time.to_rfc3339());
    let by_type = KeyType::ALL
        .iter()
        .map(|&key_type| format!("{} {key_type}", stats.type_counts.get(key_type)))
        .collect::<Vec<_>>()
        .join(", ");
    println!("  Keys by type: {by_type}");
}

fn cmd_set_paused(paused: bool) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();
    config.paused = paused;
    config.save().context("failed to save config")?;
    if paused {
        println!("Capture paused. Use 'keystroke-insight resume' to continue.");
    } else {
        println!("Capture resumed.");
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
