//! Tolerant loader for the run document.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::prd::Prd;

/// Load a fresh snapshot of the run document.
///
/// The document is externally mutated between iterations, so callers must
/// re-load it every time they consult it. A missing or unparseable
/// document yields `None`: absent data is "nothing to decide on", never a
/// loop-stopping error.
pub fn load_prd(path: &Path) -> Option<Prd> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), err = %err, "failed to read run document");
            }
            return None;
        }
    };
    match serde_json::from_str::<Prd>(&contents) {
        Ok(prd) => {
            debug!(
                stories = prd.user_stories.len(),
                branch = prd.branch().unwrap_or_default(),
                "loaded run document"
            );
            Some(prd)
        }
        Err(err) => {
            warn!(path = %path.display(), err = %err, "failed to parse run document");
            None
        }
    }
}
