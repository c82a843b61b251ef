//! Progress log lifecycle (`progress.txt`).
//!
//! The supervisor owns only the three-line preamble; everything after the
//! separator is appended by the agent across iterations. The log persists
//! across supervisor invocations and is reset exactly when the run
//! identity changes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

pub const PROGRESS_HEADER: &str = "# Progress Log";
pub const PROGRESS_SEPARATOR: &str = "===";

fn fresh_preamble() -> String {
    format!(
        "{PROGRESS_HEADER}\nStarted: {}\n{PROGRESS_SEPARATOR}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Create the progress log with a fresh preamble if it does not exist yet.
///
/// An existing log is left untouched: its content belongs to the run in
/// flight.
pub fn ensure_progress_log(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    reset_progress_log(path)
}

/// Truncate the progress log back to a fresh preamble, discarding prior
/// content. This is the only place the supervisor destroys data.
pub fn reset_progress_log(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, fresh_preamble())
        .with_context(|| format!("write progress log {}", path.display()))?;
    info!(path = %path.display(), "progress log reset");
    Ok(())
}
