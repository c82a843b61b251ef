//! Run document types (`prd.json`).
//!
//! The document is owned and edited by the agent system; the supervisor
//! reads a fresh snapshot whenever it needs one and never writes it back.
//! Only the fields the loop consumes are modeled here; everything else in
//! the document passes through untouched and uninterpreted.

use serde::Deserialize;

/// Lifecycle status of a story that has not been attempted yet.
pub const STATUS_PENDING: &str = "pending";

/// Snapshot of the run document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Prd {
    /// Branch-like label identifying the current unit of work.
    #[serde(rename = "branchName")]
    pub branch_name: Option<String>,
    /// Ordered story entries; positions are stable across iterations.
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
}

/// One trackable story within the run document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserStory {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub passes: bool,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

impl Default for UserStory {
    fn default() -> Self {
        Self {
            id: None,
            passes: false,
            status: default_status(),
        }
    }
}

impl Prd {
    /// Story at a 1-based position, if present.
    pub fn story(&self, position: usize) -> Option<&UserStory> {
        position
            .checked_sub(1)
            .and_then(|index| self.user_stories.get(index))
    }

    /// The branch label, trimmed; `None` when absent or empty.
    pub fn branch(&self) -> Option<&str> {
        self.branch_name
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

impl UserStory {
    /// Stable display id; synthesized from the position when the document
    /// omits one.
    pub fn display_id(&self, position: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("story-{position}"))
    }

    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_story_with_defaults() {
        let prd: Prd = serde_json::from_str(r#"{"user_stories": [{}]}"#).expect("parse");
        let story = prd.story(1).expect("story");
        assert_eq!(story.id, None);
        assert!(!story.passes);
        assert_eq!(story.status, STATUS_PENDING);
        assert!(story.is_pending());
    }

    #[test]
    fn story_positions_are_one_based() {
        let prd: Prd = serde_json::from_str(
            r#"{"user_stories": [{"id": "US-001"}, {"id": "US-002"}]}"#,
        )
        .expect("parse");
        assert_eq!(prd.story(1).and_then(|s| s.id.as_deref()), Some("US-001"));
        assert_eq!(prd.story(2).and_then(|s| s.id.as_deref()), Some("US-002"));
        assert!(prd.story(0).is_none());
        assert!(prd.story(3).is_none());
    }

    #[test]
    fn branch_is_trimmed_and_empty_becomes_none() {
        let prd: Prd =
            serde_json::from_str(r#"{"branchName": "  agent/checkout  "}"#).expect("parse");
        assert_eq!(prd.branch(), Some("agent/checkout"));

        let prd: Prd = serde_json::from_str(r#"{"branchName": "   "}"#).expect("parse");
        assert_eq!(prd.branch(), None);

        let prd: Prd = serde_json::from_str("{}").expect("parse");
        assert_eq!(prd.branch(), None);
    }

    #[test]
    fn display_id_synthesizes_from_position() {
        let story = UserStory::default();
        assert_eq!(story.display_id(3), "story-3");

        let story = UserStory {
            id: Some("US-007".to_string()),
            ..UserStory::default()
        };
        assert_eq!(story.display_id(3), "US-007");
    }
}
