//! Command-boundary marker protocol.
//!
//! A command sent to the shared pane scrolls into a continuous buffer that
//! also holds everything run before it. To find one invocation's output and
//! exit status inside that buffer, the command is wrapped between unique
//! single-use markers:
//!
//! ```text
//! echo __CEA_S_<token>__; <command>; echo __CEA_E_<token>_$?__; tmux wait -S cea-<token>
//! ```
//!
//! The shell expands `$?` when the end marker is echoed, so the marker that
//! lands in the buffer carries the real exit code, while the echoed command
//! line (which tmux prints back before running it) still shows the literal
//! `$?` and can never be mistaken for completion.

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide invocation counter. Combined with wall-clock millis this
/// keeps tokens unique even for commands issued within the same millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique per-command token, rendered `<wallclock-ms>-<sequence>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationToken {
    millis: u128,
    seq: u64,
}

impl InvocationToken {
    /// Mint the next token. Tokens are monotonically ordered by sequence.
    pub fn next() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self { millis, seq }
    }

    /// Start marker: `__CEA_S_<token>__`.
    pub fn start_marker(&self) -> String {
        format!("__CEA_S_{self}__")
    }

    /// End marker as written into the wrapped command, with the shell's
    /// exit-status variable still unexpanded.
    pub fn end_marker_template(&self) -> String {
        format!("__CEA_E_{self}_$?__")
    }

    /// tmux wait-for channel name tied to this invocation.
    pub fn wait_channel(&self) -> String {
        format!("cea-{self}")
    }

    /// Regex matching the *expanded* end marker and capturing its exit code.
    ///
    /// The code group is `\d*` so a marker whose code field was lost to
    /// truncation still counts as completion (and parses as exit 0). The
    /// unexpanded template (`$?`) never matches.
    fn end_marker_regex(&self) -> Regex {
        // Token text is digits and a dash; escaped anyway for hygiene.
        let token = regex::escape(&self.to_string());
        Regex::new(&format!("__CEA_E_{token}_(\\d*)__")).expect("static end-marker pattern")
    }
}

impl fmt::Display for InvocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

/// Build the wrapped shell line for `command`.
///
/// With a `workdir`, the whole marker chain is gated behind `cd`, so a bad
/// directory produces a timeout + diagnosis instead of output from the
/// wrong place. Single quotes in the path are shell-escaped.
pub fn wrap_command(command: &str, workdir: Option<&Path>, token: &InvocationToken) -> String {
    let chain = format!(
        "echo {start}; {command}; echo {end}; tmux wait -S {channel}",
        start = token.start_marker(),
        end = token.end_marker_template(),
        channel = token.wait_channel(),
    );

    match workdir {
        Some(dir) => {
            let escaped = dir.to_string_lossy().replace('\'', "'\\''");
            format!("cd '{escaped}' && {chain}")
        }
        None => chain,
    }
}

/// Scan captured pane content for this invocation's expanded end marker.
///
/// Returns the embedded exit code when found: `Some(0)` for a bare or
/// zero-coded marker, `Some(n)` otherwise, `None` while the command is
/// still running.
pub fn find_exit_code(content: &str, token: &InvocationToken) -> Option<i32> {
    let caps = token.end_marker_regex().captures(content)?;
    let code = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Some(code.parse().unwrap_or(0))
}

/// Extract the raw text strictly between this invocation's start and end
/// markers.
///
/// The echoed wrapper line also contains the start marker text, so the
/// *last* start-marker occurrence before the end marker is the real
/// boundary. Returns an empty string when the boundaries cannot be framed.
pub fn extract_output(content: &str, token: &InvocationToken) -> String {
    let Some(end) = token.end_marker_regex().find(content) else {
        return String::new();
    };
    let before_end = &content[..end.start()];

    let start_marker = token.start_marker();
    let Some(start_idx) = before_end.rfind(&start_marker) else {
        return String::new();
    };

    before_end[start_idx + start_marker.len()..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn token() -> InvocationToken {
        InvocationToken {
            millis: 1767934013546,
            seq: 1,
        }
    }

    #[test]
    fn tokens_are_unique_and_ordered() {
        let a = InvocationToken::next();
        let b = InvocationToken::next();
        assert_ne!(a.to_string(), b.to_string());
        assert!(b.seq > a.seq);
    }

    #[test]
    fn marker_shapes() {
        let t = token();
        assert_eq!(t.start_marker(), "__CEA_S_1767934013546-1__");
        assert_eq!(t.end_marker_template(), "__CEA_E_1767934013546-1_$?__");
        assert_eq!(t.wait_channel(), "cea-1767934013546-1");
    }

    #[test]
    fn wrap_without_workdir() {
        let line = wrap_command("git diff", None, &token());
        assert_eq!(
            line,
            "echo __CEA_S_1767934013546-1__; git diff; \
             echo __CEA_E_1767934013546-1_$?__; tmux wait -S cea-1767934013546-1"
        );
    }

    #[test]
    fn wrap_with_workdir_gates_on_cd() {
        let line = wrap_command("pwd", Some(&PathBuf::from("/tmp/x y")), &token());
        assert!(line.starts_with("cd '/tmp/x y' && echo __CEA_S_"));
    }

    #[test]
    fn wrap_escapes_single_quotes_in_workdir() {
        let line = wrap_command("pwd", Some(&PathBuf::from("/tmp/it's")), &token());
        assert!(line.contains("cd '/tmp/it'\\''s' &&"));
    }

    #[test]
    fn unexpanded_template_is_not_completion() {
        let t = token();
        let content = format!("$ echo {}; ls; echo {}", t.start_marker(), t.end_marker_template());
        assert_eq!(find_exit_code(&content, &t), None);
    }

    #[test]
    fn expanded_marker_yields_exit_code() {
        let t = token();
        let content = "output\n__CEA_E_1767934013546-1_42__\n$";
        assert_eq!(find_exit_code(content, &t), Some(42));
    }

    #[test]
    fn bare_code_field_parses_as_zero() {
        let t = token();
        let content = "output\n__CEA_E_1767934013546-1___\n$";
        assert_eq!(find_exit_code(content, &t), Some(0));
    }

    #[test]
    fn other_tokens_do_not_match() {
        let t = token();
        let content = "old run\n__CEA_E_1767934013546-0_0__\n$";
        assert_eq!(find_exit_code(content, &t), None);
    }

    #[test]
    fn extract_uses_last_start_before_end() {
        let t = token();
        let content = format!(
            "$ echo {s}; cat f; echo {tpl}; tmux wait -S {ch}\n{s}\nhello world\n__CEA_E_1767934013546-1_0__\n$",
            s = t.start_marker(),
            tpl = t.end_marker_template(),
            ch = t.wait_channel(),
        );
        let raw = extract_output(&content, &t);
        assert!(raw.contains("hello world"));
        assert!(!raw.contains("echo __CEA_S_"));
    }

    #[test]
    fn extract_empty_when_unframed() {
        let t = token();
        assert_eq!(extract_output("no markers here", &t), "");
    }
}
