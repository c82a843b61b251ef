//! The supervision loop: one agent invocation per iteration until a stop
//! condition fires or the iteration budget runs out.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::core::completion::transcript_is_complete;
use crate::core::stop_gate::{GateState, StopGate};
use crate::io::agent::{Agent, Transcript};
use crate::io::paths::LoopPaths;
use crate::io::prd_store::load_prd;
use crate::io::progress_log::{ensure_progress_log, reset_progress_log};
use crate::io::rotation::{archive_run, branch_changed, read_last_branch, write_last_branch};
use crate::prd::Prd;

/// Fixed pause between iterations, to avoid a tight re-invocation cycle.
const ITERATION_PAUSE: Duration = Duration::from_secs(2);

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// The agent emitted the completion marker.
    Complete,
    /// The targeted story passed.
    StoryPassed { position: usize, id: String },
    /// The targeted story was attempted and did not pass.
    StoryFailed {
        position: usize,
        id: String,
        status: String,
    },
    /// The iteration budget ran out before any stop condition fired.
    BudgetExhausted { iterations: u32 },
}

impl LoopStop {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete | Self::StoryPassed { .. })
    }
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub iterations_run: u32,
    pub stop: LoopStop,
}

/// Options for `run_loop`.
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Maximum number of agent invocations.
    pub max_iterations: u32,
    /// Optional 1-based story position that narrows success to one story.
    pub target_story: Option<usize>,
    /// Pause inserted between iterations. Fixed in production; tests zero it.
    pub pause: Duration,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            target_story: None,
            pause: ITERATION_PAUSE,
        }
    }
}

/// Invoke the agent once per iteration until the transcript signals
/// completion, the targeted story reaches a terminal state, or the budget
/// is exhausted.
///
/// Before the first iteration: the branch label is compared against the
/// last tracked one, prior-run artifacts are archived on a change, the
/// progress log is ensured to exist, and the marker is rewritten.
pub fn run_loop<A: Agent, F: FnMut(u32, u32)>(
    paths: &LoopPaths,
    agent: &A,
    prompt: &str,
    options: &LoopOptions,
    mut on_iteration: F,
) -> Result<LoopOutcome> {
    let current_branch = rotate_if_branch_changed(paths)?;
    ensure_progress_log(&paths.progress_path)?;
    if let Some(branch) = &current_branch {
        write_last_branch(&paths.last_branch_path, branch)?;
    }

    let mut gate = options.target_story.map(StopGate::new);
    let mut iterations_run = 0u32;

    for iter in 1..=options.max_iterations {
        on_iteration(iter, options.max_iterations);
        info!(iter, max_iterations = options.max_iterations, "starting iteration");

        let transcript = match agent.invoke(prompt) {
            Ok(transcript) => transcript,
            Err(err) => {
                warn!(iter, err = %err, "agent invocation failed; no completion this iteration");
                Transcript {
                    text: String::new(),
                    exit_ok: false,
                }
            }
        };
        iterations_run = iter;
        if !transcript.exit_ok {
            info!(iter, "agent did not exit cleanly");
        }

        if transcript_is_complete(&transcript.text) {
            info!(iter, "completion marker observed");
            return Ok(LoopOutcome {
                iterations_run,
                stop: LoopStop::Complete,
            });
        }

        if let Some(gate) = gate.as_mut() {
            // Fresh snapshot: the agent edits the document during its invocation.
            let prd = load_prd(&paths.prd_path);
            let position = gate.position();
            match gate.observe(prd.as_ref()) {
                GateState::Passed => {
                    let id = story_display_id(prd.as_ref(), position);
                    info!(iter, position, id = %id, "targeted story passed");
                    return Ok(LoopOutcome {
                        iterations_run,
                        stop: LoopStop::StoryPassed { position, id },
                    });
                }
                GateState::Failed => {
                    let id = story_display_id(prd.as_ref(), position);
                    let status = prd
                        .as_ref()
                        .and_then(|prd| prd.story(position))
                        .map(|story| story.status.clone())
                        .unwrap_or_default();
                    info!(iter, position, id = %id, status = %status, "targeted story failed");
                    return Ok(LoopOutcome {
                        iterations_run,
                        stop: LoopStop::StoryFailed {
                            position,
                            id,
                            status,
                        },
                    });
                }
                GateState::Pending => {}
            }
        }

        if iter < options.max_iterations && !options.pause.is_zero() {
            thread::sleep(options.pause);
        }
    }

    info!(iterations = options.max_iterations, "iteration budget exhausted");
    Ok(LoopOutcome {
        iterations_run,
        stop: LoopStop::BudgetExhausted {
            iterations: options.max_iterations,
        },
    })
}

/// Startup rotation, evaluated exactly once before the first iteration.
///
/// Reads the document and the marker, archives the previous run's
/// artifacts when the label changed, and resets the progress log. Returns
/// the document's current label so the driver can rewrite the marker after
/// the decision.
fn rotate_if_branch_changed(paths: &LoopPaths) -> Result<Option<String>> {
    let prd = load_prd(&paths.prd_path);
    let current = prd.as_ref().and_then(Prd::branch);
    let last = read_last_branch(&paths.last_branch_path);

    if branch_changed(current, last.as_deref()) {
        let previous = last.as_deref().unwrap_or_default();
        info!(
            previous,
            current = current.unwrap_or_default(),
            "branch changed, rotating run artifacts"
        );
        // Archival is best-effort bookkeeping; a failure must not stop the run.
        if let Err(err) = archive_run(paths, previous, Local::now().date_naive()) {
            warn!(err = %err, "failed to archive previous run");
        }
        reset_progress_log(&paths.progress_path)?;
    }

    Ok(current.map(str::to_string))
}

fn story_display_id(prd: Option<&Prd>, position: usize) -> String {
    prd.and_then(|prd| prd.story(position))
        .map(|story| story.display_id(position))
        .unwrap_or_else(|| format!("story-{position}"))
}
