//! Canonical filesystem layout, anchored at the tool's own directory.
//!
//! All persisted artifacts live next to the executable, not the working
//! directory, so the loop can be re-invoked from anywhere and still find
//! its run document and prior state.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

/// All persisted paths for one supervisor installation.
#[derive(Debug, Clone)]
pub struct LoopPaths {
    pub root: PathBuf,
    /// Run document, owned and edited by the agent (`prd.json`).
    pub prd_path: PathBuf,
    /// Fixed prompt fed to the agent each iteration (`prompt.md`).
    pub prompt_path: PathBuf,
    /// Live progress log (`progress.txt`).
    pub progress_path: PathBuf,
    /// Last tracked branch label (`.last-branch`).
    pub last_branch_path: PathBuf,
    /// Root directory for archived runs (`archive/`).
    pub archive_dir: PathBuf,
    /// Supervisor configuration (`overseer.toml`).
    pub config_path: PathBuf,
}

impl LoopPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            prd_path: root.join("prd.json"),
            prompt_path: root.join("prompt.md"),
            progress_path: root.join("progress.txt"),
            last_branch_path: root.join(".last-branch"),
            archive_dir: root.join("archive"),
            config_path: root.join("overseer.toml"),
            root,
        }
    }

    /// Anchor the layout at the running executable's directory.
    pub fn from_exe() -> Result<Self> {
        let exe = std::env::current_exe().context("locate current executable")?;
        let root = exe
            .parent()
            .ok_or_else(|| anyhow!("executable {} has no parent directory", exe.display()))?;
        Ok(Self::new(root))
    }
}
