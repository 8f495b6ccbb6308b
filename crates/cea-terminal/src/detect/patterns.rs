//! Regex-pattern strategy: known prompt signatures in the pane text.
//!
//! The catalog is ordered; the first match wins. Two special cases:
//! - a *negative* entry (no suggested response) identifies benign output
//!   that superficially resembles a prompt — matching one aborts the whole
//!   strategy so noisy progress logs never fire it;
//! - pager signatures are suppressed when the last meaningful line already
//!   looks like a plain shell prompt, i.e. the pager has exited.

use super::{is_shell_prompt_line, last_meaningful_line, DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

struct PatternEntry {
    regex: Regex,
    description: &'static str,
    /// Keystroke suggestion; `None` marks a negative (never-interactive)
    /// entry.
    response: Option<&'static str>,
    /// Pager signatures get the shell-prompt suppression check.
    pager: bool,
}

impl PatternEntry {
    fn new(
        pattern: &str,
        description: &'static str,
        response: Option<&'static str>,
        pager: bool,
    ) -> Self {
        Self {
            // Case-insensitive + multiline, like the catalog's anchored
            // entries require.
            regex: Regex::new(&format!("(?im){pattern}")).expect("static catalog pattern"),
            description,
            response,
            pager,
        }
    }
}

static CATALOG: LazyLock<Vec<PatternEntry>> = LazyLock::new(|| {
    vec![
        PatternEntry::new(r"\[Y/n\]", "Yes/No prompt (default Yes)", Some("Y<Enter> or N<Enter>"), false),
        PatternEntry::new(r"\[y/N\]", "Yes/No prompt (default No)", Some("y<Enter> or N<Enter>"), false),
        PatternEntry::new(
            r"\(Y/I/N/O/D/Z\)",
            "dpkg config file conflict",
            Some("N<Enter> (keep current) or Y<Enter> (use package version)"),
            false,
        ),
        PatternEntry::new(r"\[yes/no\]", "Yes/No confirmation", Some("yes<Enter> or no<Enter>"), false),
        PatternEntry::new(
            r"Press \[ENTER\] to continue",
            "Continue prompt",
            Some("<Enter>"),
            false,
        ),
        PatternEntry::new(r"\(y/n\)", "Yes/No prompt", Some("y<Enter> or n<Enter>"), false),
        PatternEntry::new(
            r"Do you want to continue\?",
            "Continue confirmation",
            Some("y<Enter> or n<Enter>"),
            false,
        ),
        PatternEntry::new(r"Are you sure\?", "Confirmation prompt", Some("y<Enter> or n<Enter>"), false),
        PatternEntry::new(
            r"[Pp]assword:",
            "Password prompt",
            Some("Enter password then <Enter>, or <Ctrl+C> to cancel"),
            false,
        ),
        PatternEntry::new(
            r"\[default=\w+\]",
            "Prompt with default value",
            Some("<Enter> for default, or type value then <Enter>"),
            false,
        ),
        PatternEntry::new(
            r"Enter passphrase",
            "Passphrase prompt",
            Some("Enter passphrase then <Enter>"),
            false,
        ),
        PatternEntry::new(
            r"\(yes/no/\[fingerprint\]\)",
            "SSH host key verification",
            Some("yes<Enter> to accept, no<Enter> to reject"),
            false,
        ),
        PatternEntry::new(
            r"Press any key to continue",
            "Any key prompt",
            Some("<Enter> or <Space>"),
            false,
        ),
        // Negative entry: apt fetch logs in progress, never interactive.
        PatternEntry::new(r"Hit:.*\nGet:", "apt-get in progress (not interactive)", None, false),
        PatternEntry::new(
            r"\(END\)",
            "Pager (less/more) at end of file",
            Some("q<Enter> to quit pager"),
            true,
        ),
        PatternEntry::new(
            r"\(press RETURN\)",
            "Pager waiting for confirmation",
            Some("<Enter> to continue, or q<Enter> to quit"),
            true,
        ),
        PatternEntry::new(
            r"-- More --",
            "More pager waiting",
            Some("q<Enter> to quit, or <Space> for next page"),
            true,
        ),
        PatternEntry::new(
            r"HELP -- Press",
            "Pager help screen",
            Some("q<Enter> to quit help, then q<Enter> to quit pager"),
            true,
        ),
        PatternEntry::new(
            r"^:\s*$",
            "Pager command prompt (less/vim)",
            Some("q<Enter> to quit pager, or :q<Enter> for vim"),
            true,
        ),
    ]
});

pub struct PatternDetector;

#[async_trait]
impl Detector for PatternDetector {
    fn needs_pane(&self) -> bool {
        false
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        for entry in CATALOG.iter() {
            if !entry.regex.is_match(ctx.content) {
                continue;
            }

            let Some(response) = entry.response else {
                // Negative entry matched: this output is known-benign.
                return None;
            };

            if entry.pager {
                if let Some(last) = last_meaningful_line(ctx.content) {
                    if is_shell_prompt_line(last) {
                        // Pager already exited back to the shell.
                        continue;
                    }
                }
            }

            return Some(DetectionResult {
                method: DetectionMethod::RegexPattern,
                confidence: Confidence::High,
                detail: format!("Pattern matched: \"{}\"", entry.description),
                suggested_actions: vec![
                    format!("Respond with: {response}"),
                    "Or use <Ctrl+C> to cancel/interrupt".to_string(),
                ],
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn probe(content: &str) -> Option<DetectionResult> {
        let ctx = DetectionContext { content, pane: None };
        PatternDetector.probe(&ctx).await
    }

    #[tokio::test]
    async fn yes_no_prompt_is_high_confidence() {
        let result = probe("Do you want to continue? [Y/n]").await.unwrap();
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.method, DetectionMethod::RegexPattern);
        assert!(result.suggested_actions[0].contains("<Enter>"));
    }

    #[tokio::test]
    async fn password_prompt_detected() {
        let result = probe("sudo ls\nPassword:").await.unwrap();
        assert!(result.detail.contains("Password"));
    }

    #[tokio::test]
    async fn ssh_fingerprint_prompt_detected() {
        let content = "The authenticity of host 'x' can't be established.\n\
                       Are you sure you want to continue connecting (yes/no/[fingerprint])?";
        assert!(probe(content).await.is_some());
    }

    #[tokio::test]
    async fn normal_output_does_not_fire() {
        assert!(probe("Hello, World!\nThis is normal output.").await.is_none());
    }

    #[tokio::test]
    async fn apt_progress_is_negative() {
        let content = "Hit:1 http://archive.ubuntu.com jammy InRelease\n\
                       Get:2 http://archive.ubuntu.com jammy-updates InRelease";
        assert!(probe(content).await.is_none());
    }

    #[tokio::test]
    async fn pager_end_detected_while_inside_pager() {
        let result = probe("line one\nline two\n(END)").await.unwrap();
        assert!(result.detail.contains("Pager"));
    }

    #[tokio::test]
    async fn pager_suppressed_after_return_to_shell() {
        // (END) still visible in scrollback, but the shell prompt is back.
        assert!(probe("log line\n(END)\nuser@host:~$").await.is_none());
    }

    #[tokio::test]
    async fn bare_colon_last_line_is_pager_prompt() {
        let result = probe("file contents here\n:").await.unwrap();
        assert!(result.detail.contains("Pager command prompt"));
    }
}
