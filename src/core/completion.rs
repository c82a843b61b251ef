//! Completion detection over an agent transcript.

/// Literal sentinel an agent emits once every story is complete.
pub const COMPLETION_MARKER: &str = "<promise>COMPLETE</promise>";

/// True when the transcript contains the completion marker anywhere.
///
/// Exact, case-sensitive substring match; no structured parse, no fuzzy
/// semantics. Repeated markers behave the same as one.
pub fn transcript_is_complete(transcript: &str) -> bool {
    transcript.contains(COMPLETION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_anywhere_in_transcript() {
        let transcript = format!("working...\nall done {COMPLETION_MARKER} bye\n");
        assert!(transcript_is_complete(&transcript));
    }

    #[test]
    fn detects_repeated_markers_like_one() {
        let transcript = format!("{COMPLETION_MARKER}\n{COMPLETION_MARKER}\n");
        assert!(transcript_is_complete(&transcript));
    }

    #[test]
    fn ignores_transcripts_without_the_marker() {
        assert!(!transcript_is_complete("all stories complete"));
        assert!(!transcript_is_complete(""));
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!transcript_is_complete("<promise>complete</promise>"));
    }
}
