//! Test-only helpers for exercising the supervision loop without spawning
//! agent processes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;

use anyhow::{Context, Result};
use serde_json::json;

use crate::io::agent::{Agent, Transcript};
use crate::io::paths::LoopPaths;

/// One scripted agent invocation.
#[derive(Debug, Clone)]
pub struct ScriptedInvocation {
    /// Transcript text the agent "produces".
    pub transcript: String,
    /// When set, written to the run document before returning, mimicking
    /// the agent editing it mid-invocation.
    pub prd_update: Option<String>,
}

impl ScriptedInvocation {
    pub fn transcript(transcript: String) -> Self {
        Self {
            transcript,
            prd_update: None,
        }
    }

    pub fn with_prd_update(mut self, prd: String) -> Self {
        self.prd_update = Some(prd);
        self
    }
}

/// Agent that replays a script of canned invocations.
///
/// Once the script runs dry, further invocations produce an empty
/// transcript, matching an agent that keeps running without ever
/// signalling completion.
pub struct ScriptedAgent {
    paths: LoopPaths,
    script: RefCell<VecDeque<ScriptedInvocation>>,
}

impl ScriptedAgent {
    pub fn new(paths: LoopPaths, script: Vec<ScriptedInvocation>) -> Self {
        Self {
            paths,
            script: RefCell::new(script.into()),
        }
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&self, _prompt: &str) -> Result<Transcript> {
        let next = self.script.borrow_mut().pop_front();
        let Some(invocation) = next else {
            return Ok(Transcript {
                text: String::new(),
                exit_ok: true,
            });
        };
        if let Some(prd) = invocation.prd_update {
            fs::write(&self.paths.prd_path, prd).context("write scripted run document")?;
        }
        Ok(Transcript {
            text: invocation.transcript,
            exit_ok: true,
        })
    }
}

/// Temporary on-disk workspace with the supervisor's canonical layout.
pub struct TestWorkspace {
    _temp: tempfile::TempDir,
    pub paths: LoopPaths,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let paths = LoopPaths::new(temp.path());
        Ok(Self { _temp: temp, paths })
    }

    pub fn write_prd(&self, json: &str) -> Result<()> {
        fs::write(&self.paths.prd_path, json).context("write run document")
    }

    pub fn scripted_agent(&self, script: Vec<ScriptedInvocation>) -> ScriptedAgent {
        ScriptedAgent::new(self.paths.clone(), script)
    }

    /// Names of directories currently under the archive root.
    pub fn archive_dirs(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.paths.archive_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Render a run document with the given branch and `(passes, status)`
/// story fields.
pub fn prd_json(branch: Option<&str>, stories: &[(bool, &str)]) -> String {
    let stories: Vec<_> = stories
        .iter()
        .map(|(passes, status)| json!({"passes": passes, "status": status}))
        .collect();
    let mut doc = json!({ "user_stories": stories });
    if let Some(branch) = branch {
        doc["branchName"] = json!(branch);
    }
    doc.to_string()
}
