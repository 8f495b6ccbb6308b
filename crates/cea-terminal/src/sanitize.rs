//! Output sanitizer: strips the marker protocol back out of captured text.
//!
//! Captured pane content contains the wrapped command echo, the markers
//! themselves, and the tmux wait clause — none of which may ever reach the
//! caller. Markers can also arrive *fragmented* (line wrap, slow flush), so
//! whole lines that look like any truncation of a marker are dropped, while
//! ordinary text that merely resembles a marker prefix is preserved
//! verbatim. Stripping is deterministic and idempotent.

use regex::Regex;
use std::sync::LazyLock;

/// Well-formed start marker, anywhere in a line.
static START_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__CEA_S_\d+-\d+__").expect("static pattern"));

/// Well-formed end marker with exit code, anywhere in a line.
static END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__CEA_E_\d+-\d+_\d+__").expect("static pattern"));

/// A line that is nothing but a (possibly truncated) start marker.
static START_FRAGMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*__CEA_S_\d+-\d+_*(?:__)?\s*$").expect("static pattern"));

/// A line that is nothing but a (possibly truncated) end marker: the exit
/// code and closing underscores may each be partially emitted.
static END_FRAGMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*__CEA_E_\d+-\d+_\d*_*(?:__)?\s*$").expect("static pattern"));

/// The wrapper command echoing a start marker — the pane prints the command
/// line itself before running it.
static WRAPPER_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\becho\s+__CEA_S_\d+-\d+__").expect("static pattern"));

/// Trailing `; tmux wait -S cea-<token>` clause (the `-S` may be missing
/// when the line was reassembled from wrapped fragments).
static WAIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*;?\s*tmux\s+wait(?:\s+-S)?\s+cea-[0-9a-z-]+\s*$").expect("static pattern")
});

/// Three or more consecutive newlines.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static pattern"));

/// Remove every trace of the marker protocol from `content`.
///
/// Line-by-line: whole-line marker fragments and wrapper echo lines are
/// dropped; trailing wait clauses and mid-line well-formed markers are
/// substituted away. Afterwards runs of 3+ blank lines collapse to one and
/// the result is trimmed.
pub fn strip_internal_markers(content: &str) -> String {
    // Fast path: nothing protocol-shaped in here at all.
    if !content.contains("__CEA_") && !content.contains("tmux wait") {
        return content.trim().to_string();
    }

    let mut cleaned: Vec<String> = Vec::new();

    for line in content.split('\n') {
        let trimmed = line.trim();

        if !trimmed.is_empty()
            && (START_FRAGMENT_LINE.is_match(trimmed) || END_FRAGMENT_LINE.is_match(trimmed))
        {
            continue;
        }

        if WRAPPER_ECHO.is_match(line) {
            continue;
        }

        let without_wait = WAIT_CLAUSE.replace(line, "");
        let without_start = START_MARKER.replace_all(&without_wait, "");
        let without_end = END_MARKER.replace_all(&without_start, "");

        cleaned.push(without_end.into_owned());
    }

    let joined = cleaned.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_start_marker_lines() {
        let content = "some output\n__CEA_S_1767934013546-1__\nmore output";
        let result = strip_internal_markers(content);
        assert!(!result.contains("__CEA_S_"));
        assert!(result.contains("some output"));
        assert!(result.contains("more output"));
    }

    #[test]
    fn removes_exit_marker_with_code() {
        let content = "output\n__CEA_E_1767934013546-1_0__\nprompt$";
        let result = strip_internal_markers(content);
        assert!(!result.contains("__CEA_E_"));
        assert!(result.contains("output"));
        assert!(result.contains("prompt$"));
    }

    #[test]
    fn removes_exit_marker_with_nonzero_code() {
        let result = strip_internal_markers("error output\n__CEA_E_123-1_127__\nprompt$");
        assert!(!result.contains("__CEA_E_"));
        assert!(!result.contains("127__"));
    }

    #[test]
    fn removes_partial_exit_marker_without_code() {
        let result = strip_internal_markers("output\n__CEA_E_123-1___\nprompt$");
        assert!(!result.contains("__CEA_E_"));
    }

    #[test]
    fn removes_truncated_start_marker_missing_closing() {
        let result = strip_internal_markers("output\n__CEA_S_123-1\nmore");
        assert!(!result.contains("__CEA_S_"));
        assert!(result.contains("more"));
    }

    #[test]
    fn removes_wrapper_echo_line() {
        let result = strip_internal_markers("echo __CEA_S_123-1__; ls -la");
        assert!(!result.contains("echo __CEA_S_"));
    }

    #[test]
    fn removes_trailing_wait_clause() {
        let result = strip_internal_markers("command; tmux wait -S cea-123-456");
        assert!(!result.contains("tmux wait"));
        assert!(result.contains("command"));
    }

    #[test]
    fn removes_wait_clause_without_dash_s() {
        let result = strip_internal_markers("command; tmux wait cea-session-123");
        assert!(!result.contains("tmux wait"));
    }

    #[test]
    fn removes_midline_markers_keeping_surrounding_text() {
        let result = strip_internal_markers("before __CEA_S_123-1__ after");
        assert_eq!(result, "before  after");
    }

    #[test]
    fn preserves_lookalike_text() {
        let content = "the prefix __CEA_S_ appears in docs\nand __CEA_E_abc__ too";
        let result = strip_internal_markers(content);
        assert!(result.contains("the prefix __CEA_S_ appears in docs"));
        assert!(result.contains("__CEA_E_abc__"));
    }

    #[test]
    fn realistic_combined_capture() {
        let content = "set +H\n\
             echo __CEA_S_1767934013546-1__; git diff; echo __CEA_E_1767934013546-1_$?__; tmux wait -S cea-1767934013298\n\
             __CEA_S_1767934013546-1__\n\
             diff --git a/README.md b/README.md\n\
             +++ b/README.md\n\
             __CEA_E_1767934013546-1_0__\n\
             \n\
             host:repo user$";
        let result = strip_internal_markers(content);
        assert!(!result.contains("__CEA_S_"));
        assert!(!result.contains("__CEA_E_"));
        assert!(!result.contains("tmux wait"));
        assert!(result.contains("diff --git"));
        assert!(result.contains("host:repo user$"));
    }

    #[test]
    fn collapses_blank_line_runs() {
        let content = "a\n__CEA_S_1-1__\n\n\n\n__CEA_E_1-1_0__\nb";
        let result = strip_internal_markers(content);
        assert!(!result.contains("\n\n\n"));
    }

    #[test]
    fn stripping_is_idempotent() {
        let content = "x\n__CEA_S_12-3__\ny; tmux wait -S cea-12-3\n__CEA_E_12-3_0__\nz";
        let once = strip_internal_markers(content);
        let twice = strip_internal_markers(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn marker_only_content_becomes_empty() {
        let content = "__CEA_S_1-1__\n__CEA_E_1-1_0__";
        assert_eq!(strip_internal_markers(content), "");
    }

    #[test]
    fn plain_text_only_trimmed() {
        assert_eq!(strip_internal_markers("  hello \n"), "hello");
    }
}
