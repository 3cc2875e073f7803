//! Export of session snapshots.
//!
//! The text format has one line per entry:
//!
//! ```text
//! [2024-05-01T09:30:00.125Z] a (KeyA) 182ms
//! ```

use crate::collector::types::KeyEntry;
use crate::core::session::Snapshot;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Machine-readable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// A single pretty-printed array
    Pretty,
    /// One JSON object per line
    Lines,
}

/// Format a single entry as a text line (without trailing newline).
pub fn format_line(entry: &KeyEntry) -> String {
    format!(
        "[{}] {} ({}) {}ms",
        entry.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
        entry.key(),
        entry.code(),
        entry.interval()
    )
}

/// Render the whole snapshot in the text format.
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for entry in snapshot.iter() {
        let _ = writeln!(out, "{}", format_line(entry));
    }
    out
}

/// File name for a text export made at `now`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("keystrokes_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Write the text export into `dir` and return the file path.
pub fn write_text(snapshot: &Snapshot, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now));
    std::fs::write(&path, render_text(snapshot))?;

    tracing::info!(entries = snapshot.len(), path = %path.display(), "keystrokes exported");
    Ok(path)
}

/// Write the snapshot as JSON.
pub fn write_json(snapshot: &Snapshot, path: &Path, format: JsonFormat) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(snapshot.entries())?,
        JsonFormat::Lines => {
            let mut out = String::new();
            for entry in snapshot.iter() {
                out.push_str(&serde_json::to_string(entry)?);
                out.push('\n');
            }
            out
        }
    };

    std::fs::write(path, content)?;
    Ok(())
}
