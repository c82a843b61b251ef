//! Child process execution with live echo and bounded capture.
//!
//! The agent's output has two consumers: the operator watching the loop,
//! and the supervisor inspecting the transcript afterwards. Each pipe is
//! drained by a single read loop that forwards every line to the echo sink
//! and appends it to a shared capture buffer, so neither consumer can fall
//! behind the other.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};

/// Captured output of one agent invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    /// Interleaved stdout and stderr, line-granular.
    pub combined: Vec<u8>,
    /// Bytes discarded past the capture limit (the pipes are still drained).
    pub truncated: usize,
}

/// Sink that receives every output line as it is produced.
pub type EchoSink = Arc<Mutex<dyn Write + Send>>;

struct Capture {
    buf: Vec<u8>,
    truncated: usize,
    limit: usize,
}

impl Capture {
    fn push(&mut self, line: &[u8]) {
        let remaining = self.limit.saturating_sub(self.buf.len());
        let keep = line.len().min(remaining);
        self.buf.extend_from_slice(&line[..keep]);
        self.truncated += line.len() - keep;
    }
}

/// Run a command to completion, teeing its stdout and stderr to `echo`
/// while capturing a combined transcript.
///
/// No timeout is imposed: the child may block for as long as it needs, and
/// interrupting the whole supervisor is the only cancellation mechanism.
/// `limit` bounds the bytes retained in memory; output past it is drained
/// and discarded so the child never stalls on a full pipe.
#[instrument(skip_all, fields(limit, echoing = echo.is_some()))]
pub fn run_streaming(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    limit: usize,
    echo: Option<EchoSink>,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn command");
            return Err(err).context("spawn command");
        }
    };

    if let Some(input) = stdin {
        let mut child_stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        child_stdin.write_all(input).context("write stdin")?;
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let capture = Arc::new(Mutex::new(Capture {
        buf: Vec::new(),
        truncated: 0,
        limit,
    }));

    let stdout_handle = {
        let capture = Arc::clone(&capture);
        let echo = echo.clone();
        thread::spawn(move || pump(stdout, &capture, echo.as_ref()))
    };
    let stderr_handle = {
        let capture = Arc::clone(&capture);
        thread::spawn(move || pump(stderr, &capture, echo.as_ref()))
    };

    let status = child.wait().context("wait for command")?;
    join_pump(stdout_handle).context("join stdout reader")?;
    join_pump(stderr_handle).context("join stderr reader")?;

    let mut capture = capture
        .lock()
        .map_err(|_| anyhow!("capture mutex poisoned"))?;
    if capture.truncated > 0 {
        warn!(truncated = capture.truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), "command finished");
    Ok(CommandOutput {
        status,
        combined: std::mem::take(&mut capture.buf),
        truncated: capture.truncated,
    })
}

/// Read one pipe line-by-line, echoing then capturing each line.
fn pump<R: Read>(reader: R, capture: &Mutex<Capture>, echo: Option<&EchoSink>) -> Result<()> {
    let mut reader = BufReader::new(reader);
    loop {
        let mut line = Vec::new();
        let n = reader.read_until(b'\n', &mut line).context("read output")?;
        if n == 0 {
            break;
        }

        if let Some(sink) = echo
            && let Ok(mut writer) = sink.lock()
        {
            if let Err(err) = writer.write_all(&line) {
                warn!(err = %err, "failed to echo output line");
            } else if let Err(err) = writer.flush() {
                warn!(err = %err, "failed to flush echo sink");
            }
        }

        if let Ok(mut capture) = capture.lock() {
            capture.push(&line);
        }
    }
    Ok(())
}

fn join_pump(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}
