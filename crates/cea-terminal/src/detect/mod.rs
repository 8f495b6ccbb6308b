//! Interactive-state detection: "is this session blocked on user input?"
//!
//! An ensemble of independent strategies, each implementing [`Detector`].
//! Strategies never fail loudly — any OS-call problem inside one degrades to
//! "no result". Adding a strategy means adding an implementation to
//! [`detectors`], not editing a dispatch chain.

mod cursor;
mod last_line;
mod patterns;
mod proc_tty;
mod process_state;
mod stall;

use crate::tmux::TmuxPane;
use crate::types::{Confidence, DetectionResult, InteractiveProbe};
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

pub use cursor::CursorDetector;
pub use last_line::LastLineDetector;
pub use patterns::PatternDetector;
pub use proc_tty::ProcTtyDetector;
pub use process_state::ProcessStateDetector;
pub use stall::StallDetector;

/// What a strategy gets to look at.
pub struct DetectionContext<'a> {
    /// Captured pane text (visible screen).
    pub content: &'a str,

    /// The live pane, when the caller has one. Strategies that inspect
    /// process or cursor state return nothing without it.
    pub pane: Option<&'a TmuxPane>,
}

/// One detection strategy.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Whether this strategy needs a live pane to say anything.
    fn needs_pane(&self) -> bool;

    /// Inspect the context; `None` means "nothing to report".
    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult>;
}

/// The fixed strategy list, in invocation order.
pub fn detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(PatternDetector),
        Box::new(ProcTtyDetector),
        Box::new(ProcessStateDetector),
        Box::new(CursorDetector),
        Box::new(StallDetector),
        Box::new(LastLineDetector),
    ]
}

/// Run the ensemble and return all hits, highest confidence first.
///
/// Context-free strategies always run; pane-dependent ones only when the
/// context carries a pane. The sort is stable, so equal-confidence results
/// keep their strategy order.
pub async fn detect_interactive_prompt(ctx: &DetectionContext<'_>) -> Vec<DetectionResult> {
    let mut results = Vec::new();

    for detector in detectors() {
        if detector.needs_pane() && ctx.pane.is_none() {
            continue;
        }
        if let Some(result) = detector.probe(ctx).await {
            debug!(method = %result.method, confidence = %result.confidence, "detector fired");
            results.push(result);
        }
    }

    results.sort_by_key(|r| r.confidence.rank());
    results
}

/// Render detection results for presentation to the agent.
///
/// Suggested actions come from the single highest-confidence result when
/// any reached high confidence, otherwise from the de-duplicated union of
/// all results' actions.
pub fn format_detection_results(results: &[DetectionResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut lines = vec!["[INTERACTIVE PROMPT DETECTED]".to_string(), String::new()];

    for result in results {
        lines.push(format!(
            "• Detection method: {} (confidence: {})",
            result.method, result.confidence
        ));
        lines.push(format!("  {}", result.detail));
    }

    lines.push(String::new());
    lines.push("[SUGGESTED ACTIONS]".to_string());

    match results.iter().find(|r| r.confidence == Confidence::High) {
        Some(best) => {
            for action in &best.suggested_actions {
                lines.push(format!("• {action}"));
            }
        }
        None => {
            let mut seen = Vec::new();
            for result in results {
                for action in &result.suggested_actions {
                    if !seen.contains(action) {
                        seen.push(action.clone());
                    }
                }
            }
            for action in seen {
                lines.push(format!("• {action}"));
            }
        }
    }

    lines.join("\n")
}

/// Fail-closed public entry point: is the named session blocked on input
/// right now?
///
/// A session that cannot be queried at all reports `is_interactive = true`
/// with reason `session-unreachable` — never a silent "idle". An
/// unqueryable session is indistinguishable from a blocked one, and the
/// safe assumption is the one that prevents an indefinite wait.
pub async fn probe_session(session_name: &str) -> InteractiveProbe {
    let pane = TmuxPane::attach(session_name);

    if !pane.exists().await {
        return InteractiveProbe {
            is_interactive: true,
            reason: "session-unreachable".to_string(),
        };
    }

    let content = match pane.capture(false).await {
        Ok(content) => content,
        Err(_) => {
            return InteractiveProbe {
                is_interactive: true,
                reason: "session-unreachable".to_string(),
            };
        }
    };

    let ctx = DetectionContext {
        content: &content,
        pane: Some(&pane),
    };
    let results = detect_interactive_prompt(&ctx).await;

    match results.first() {
        Some(top) => InteractiveProbe {
            is_interactive: true,
            reason: top.method.to_string(),
        },
        None => InteractiveProbe {
            is_interactive: false,
            reason: "no-detection".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Shared helpers for the strategies
// ---------------------------------------------------------------------------

/// A line that is *only* a bare shell prompt character.
static SHELL_PROMPT_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[$#%]\s*$").expect("static pattern"));

/// A line ending in a shell prompt character.
static SHELL_PROMPT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$#%]\s*$").expect("static pattern"));

/// The last non-blank line that is not marker or wait-signal noise.
pub(crate) fn last_meaningful_line(content: &str) -> Option<&str> {
    content
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| !line.contains("__CEA_") && !line.contains("tmux wait"))
}

/// Whether `line` looks like the shell has already returned to its prompt.
pub(crate) fn is_shell_prompt_line(line: &str) -> bool {
    SHELL_PROMPT_ONLY.is_match(line) || SHELL_PROMPT_END.is_match(line)
}

pub(crate) fn is_bare_prompt_line(line: &str) -> bool {
    SHELL_PROMPT_ONLY.is_match(line)
}

/// Time bound on any subprocess a strategy spawns.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a probe subprocess, returning its stdout on success and `None` on
/// any failure (missing binary, non-zero exit, timeout).
pub(crate) async fn run_capture(program: &str, args: &[&str]) -> Option<String> {
    let fut = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();

    let output = tokio::time::timeout(PROBE_TIMEOUT, fut).await.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionMethod;

    fn result(method: DetectionMethod, confidence: Confidence, action: &str) -> DetectionResult {
        DetectionResult {
            method,
            confidence,
            detail: format!("{method} fired"),
            suggested_actions: vec![action.to_string()],
        }
    }

    #[tokio::test]
    async fn prompt_text_fires_and_orders_by_confidence() {
        let ctx = DetectionContext {
            content: "Do you want to continue? [Y/n]",
            pane: None,
        };
        let results = detect_interactive_prompt(&ctx).await;
        assert!(!results.is_empty());
        assert_eq!(results[0].method, DetectionMethod::RegexPattern);
        assert_eq!(results[0].confidence, Confidence::High);

        let ranks: Vec<u8> = results.iter().map(|r| r.confidence.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[tokio::test]
    async fn normal_output_fires_nothing() {
        let ctx = DetectionContext {
            content: "Hello, World!\nThis is normal output.",
            pane: None,
        };
        let results = detect_interactive_prompt(&ctx).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn probe_nonexistent_session_fails_closed() {
        if !TmuxPane::available().await {
            eprintln!("tmux not available; skipping");
            return;
        }
        let probe = probe_session("cea-definitely-not-a-session").await;
        assert!(probe.is_interactive);
        assert_eq!(probe.reason, "session-unreachable");
    }

    #[test]
    fn last_meaningful_line_skips_markers_and_blanks() {
        let content = "real output\n__CEA_E_1-1_0__\n  \ncmd; tmux wait -S cea-1-1\n";
        assert_eq!(last_meaningful_line(content), Some("real output"));
    }

    #[test]
    fn formatting_high_confidence_selects_single_action_set() {
        let results = vec![
            result(DetectionMethod::RegexPattern, Confidence::High, "Respond with: y<Enter>"),
            result(DetectionMethod::LastLinePrompt, Confidence::Low, "Inspect the screen"),
        ];
        let text = format_detection_results(&results);
        assert!(text.contains("[INTERACTIVE PROMPT DETECTED]"));
        assert!(text.contains("Respond with: y<Enter>"));
        assert!(!text.contains("Inspect the screen"));
    }

    #[test]
    fn formatting_without_high_unions_deduplicated_actions() {
        let results = vec![
            result(DetectionMethod::ProcessState, Confidence::Medium, "Try <Enter>"),
            result(DetectionMethod::LastLinePrompt, Confidence::Low, "Try <Enter>"),
            result(DetectionMethod::OutputStall, Confidence::Low, "Check the screen"),
        ];
        let text = format_detection_results(&results);
        assert_eq!(text.matches("• Try <Enter>").count(), 1);
        assert!(text.contains("• Check the screen"));
    }

    #[test]
    fn formatting_empty_results_is_empty() {
        assert_eq!(format_detection_results(&[]), "");
    }
}
