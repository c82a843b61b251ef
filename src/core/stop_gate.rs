//! Stop-gate state machine for a single targeted story.
//!
//! When a target position is configured, the gate inspects that story's
//! `passes`/`status` fields after each iteration and decides whether the
//! loop stops. The pending-vs-attempted distinction matters: `passes`
//! defaults to false before the agent has touched a story, so an
//! unattempted story must never be misreported as a failure.

use crate::prd::Prd;

/// Verdict for the targeted story after one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The story has not been attempted yet; keep iterating.
    Pending,
    /// The story passed; stop with success.
    Passed,
    /// The story was attempted and did not pass; stop with failure.
    Failed,
}

/// Gate over one story position, retaining the last observed state.
///
/// A missing document or missing story entry is a no-op: the gate keeps
/// whatever state it last observed rather than fabricating a decision
/// from absent data.
#[derive(Debug, Clone)]
pub struct StopGate {
    position: usize,
    state: GateState,
}

impl StopGate {
    /// Gate watching the story at a 1-based `position`.
    pub fn new(position: usize) -> Self {
        Self {
            position,
            state: GateState::Pending,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Evaluate the gate against a fresh document snapshot.
    pub fn observe(&mut self, prd: Option<&Prd>) -> GateState {
        let Some(story) = prd.and_then(|prd| prd.story(self.position)) else {
            return self.state;
        };

        self.state = if story.passes {
            GateState::Passed
        } else if !story.is_pending() {
            GateState::Failed
        } else {
            GateState::Pending
        };
        self.state
    }
}
