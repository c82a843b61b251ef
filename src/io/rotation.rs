//! Run rotation: branch-change detection and archival of prior-run state.
//!
//! The run document carries a branch-like label identifying the unit of
//! work. When the label recorded at the end of the previous invocation
//! differs from the current one, the prior run's document and progress log
//! are copied into a dated archive directory before the live log is reset.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::io::paths::LoopPaths;

/// Namespace prefix stripped from branch labels when naming archive folders.
const BRANCH_NAMESPACE: &str = "agent/";

/// Bound on same-day collision probing.
const MAX_ARCHIVE_SUFFIX: u32 = 999;

/// Read the last tracked branch label, if one was recorded.
pub fn read_last_branch(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let label = contents.trim();
            if label.is_empty() {
                None
            } else {
                Some(label.to_string())
            }
        }
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), err = %err, "failed to read last-branch marker");
            }
            None
        }
    }
}

/// Atomically record `branch` as the last tracked label (temp file + rename).
pub fn write_last_branch(path: &Path, branch: &str) -> Result<()> {
    debug!(branch, "recording last branch");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, format!("{branch}\n"))
        .with_context(|| format!("write temp marker {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace marker {}", path.display()))?;
    Ok(())
}

/// True when the current label differs from the previously recorded one.
///
/// Absence on either side means "nothing to compare", not a change.
pub fn branch_changed(current: Option<&str>, last: Option<&str>) -> bool {
    match (current, last) {
        (Some(current), Some(last)) => current != last,
        _ => false,
    }
}

/// Copy the prior run's artifacts into `archive/<date>-<label>/`.
///
/// The namespace prefix is stripped from the label. Missing artifacts are
/// skipped. A same-day record for the same label gets a numeric suffix
/// instead of being merged into the existing directory.
pub fn archive_run(paths: &LoopPaths, previous_branch: &str, date: NaiveDate) -> Result<PathBuf> {
    let label = previous_branch
        .strip_prefix(BRANCH_NAMESPACE)
        .unwrap_or(previous_branch)
        .replace('/', "-");
    let base = format!("{}-{}", date.format("%Y-%m-%d"), label);
    let dir = unique_archive_dir(&paths.archive_dir, &base)?;

    fs::create_dir_all(&dir)
        .with_context(|| format!("create archive directory {}", dir.display()))?;
    copy_if_exists(&paths.prd_path, &dir)?;
    copy_if_exists(&paths.progress_path, &dir)?;

    info!(dir = %dir.display(), "archived previous run");
    Ok(dir)
}

/// First free directory name under `archive_dir` for `base`.
fn unique_archive_dir(archive_dir: &Path, base: &str) -> Result<PathBuf> {
    let first = archive_dir.join(base);
    if !first.exists() {
        return Ok(first);
    }
    for suffix in 2..=MAX_ARCHIVE_SUFFIX {
        let candidate = archive_dir.join(format!("{base}-{suffix}"));
        if !candidate.exists() {
            warn!(base, suffix, "archive name collision, using suffixed directory");
            return Ok(candidate);
        }
    }
    Err(anyhow!(
        "unable to find a free archive directory for '{base}'"
    ))
}

fn copy_if_exists(source: &Path, dir: &Path) -> Result<()> {
    if !source.exists() {
        debug!(source = %source.display(), "nothing to archive");
        return Ok(());
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("archive source {} has no file name", source.display()))?;
    let target = dir.join(file_name);
    fs::copy(source, &target)
        .with_context(|| format!("copy {} to {}", source.display(), target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).expect("date")
    }

    #[test]
    fn branch_changed_requires_both_labels() {
        assert!(branch_changed(Some("agent/b"), Some("agent/a")));
        assert!(!branch_changed(Some("agent/a"), Some("agent/a")));
        assert!(!branch_changed(Some("agent/a"), None));
        assert!(!branch_changed(None, Some("agent/a")));
        assert!(!branch_changed(None, None));
    }

    #[test]
    fn last_branch_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".last-branch");

        assert_eq!(read_last_branch(&path), None);
        write_last_branch(&path, "agent/checkout").expect("write");
        assert_eq!(read_last_branch(&path), Some("agent/checkout".to_string()));
    }

    #[test]
    fn blank_marker_reads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".last-branch");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(read_last_branch(&path), None);
    }

    #[test]
    fn archive_copies_document_and_progress_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LoopPaths::new(temp.path());
        fs::write(&paths.prd_path, r#"{"branchName": "agent/old"}"#).expect("write prd");
        fs::write(&paths.progress_path, "old progress\n").expect("write progress");

        let dir = archive_run(&paths, "agent/old", date()).expect("archive");

        assert_eq!(dir, paths.archive_dir.join("2026-08-07-old"));
        let prd = fs::read_to_string(dir.join("prd.json")).expect("read archived prd");
        assert!(prd.contains("agent/old"));
        let progress = fs::read_to_string(dir.join("progress.txt")).expect("read archived log");
        assert_eq!(progress, "old progress\n");
    }

    #[test]
    fn archive_skips_missing_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LoopPaths::new(temp.path());
        fs::write(&paths.prd_path, "{}").expect("write prd");

        let dir = archive_run(&paths, "agent/old", date()).expect("archive");

        assert!(dir.join("prd.json").is_file());
        assert!(!dir.join("progress.txt").exists());
    }

    #[test]
    fn same_day_collision_gets_numeric_suffix() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LoopPaths::new(temp.path());
        fs::write(&paths.prd_path, "{}").expect("write prd");

        let first = archive_run(&paths, "agent/old", date()).expect("first");
        let second = archive_run(&paths, "agent/old", date()).expect("second");

        assert_eq!(first, paths.archive_dir.join("2026-08-07-old"));
        assert_eq!(second, paths.archive_dir.join("2026-08-07-old-2"));
    }

    #[test]
    fn only_the_known_namespace_prefix_is_stripped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LoopPaths::new(temp.path());

        let dir = archive_run(&paths, "hotfix/login", date()).expect("archive");
        assert_eq!(dir, paths.archive_dir.join("2026-08-07-hotfix-login"));
    }
}
