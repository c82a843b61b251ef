//! Agent invocation backend.
//!
//! The [`Agent`] trait decouples the supervision loop from the concrete
//! agent CLI (currently `claude`). Tests use scripted agents that return
//! canned transcripts without spawning processes.

use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::io::process::{EchoSink, run_streaming};

/// One iteration's captured transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Combined stdout and stderr of the invocation.
    pub text: String,
    /// Whether the agent exited zero. A nonzero exit is tolerated; it only
    /// means no completion can be expected from this iteration.
    pub exit_ok: bool,
}

/// Abstraction over agent execution backends.
pub trait Agent {
    /// Run the agent once with `prompt` on stdin, echoing output live
    /// while capturing it for inspection.
    fn invoke(&self, prompt: &str) -> Result<Transcript>;
}

/// Agent backed by an external CLI command.
#[derive(Debug)]
pub struct CliAgent {
    command: Vec<String>,
    output_limit_bytes: usize,
}

impl CliAgent {
    pub fn new(command: Vec<String>, output_limit_bytes: usize) -> Result<Self> {
        if command.is_empty() {
            return Err(anyhow!("agent command must not be empty"));
        }
        Ok(Self {
            command,
            output_limit_bytes,
        })
    }
}

impl Agent for CliAgent {
    #[instrument(skip_all, fields(command = %self.command[0]))]
    fn invoke(&self, prompt: &str) -> Result<Transcript> {
        info!("invoking agent");
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);

        let echo: EchoSink = Arc::new(Mutex::new(io::stdout()));
        let output = run_streaming(
            cmd,
            Some(prompt.as_bytes()),
            self.output_limit_bytes,
            Some(echo),
        )
        .context("run agent command")?;

        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "agent exited nonzero");
        }

        Ok(Transcript {
            text: String::from_utf8_lossy(&output.combined).into_owned(),
            exit_ok: output.status.success(),
        })
    }
}
