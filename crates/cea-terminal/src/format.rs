//! Structured messages returned to the agent in place of raw output.
//!
//! Timeouts and background launches resolve with readable guidance rather
//! than errors — the consumer is a reasoning agent that can act on text but
//! not on an exception.

use crate::detect::format_detection_results;
use crate::sanitize::strip_internal_markers;
use crate::types::DetectionResult;

const TERMINAL_SCREEN_PREFIX: &str = "=== Current Terminal Screen ===";
const TERMINAL_SCREEN_SUFFIX: &str = "=== End of Screen ===";
const SYSTEM_REMINDER_PREFIX: &str = "[SYSTEM REMINDER]";
const TIMEOUT_PREFIX: &str = "[TIMEOUT]";
const BACKGROUND_PREFIX: &str = "[Background process started]";

/// Fixed sentinel for empty, whitespace-only, or marker-only screens.
pub const NO_VISIBLE_OUTPUT: &str = "(no visible output)";

/// Sanitize `content` and frame it between fixed banner lines.
pub fn format_terminal_screen(content: &str) -> String {
    let cleaned = strip_internal_markers(content);
    if cleaned.is_empty() {
        return NO_VISIBLE_OUTPUT.to_string();
    }
    format!("{TERMINAL_SCREEN_PREFIX}\n{cleaned}\n{TERMINAL_SCREEN_SUFFIX}")
}

pub fn format_system_reminder(message: &str) -> String {
    format!("{SYSTEM_REMINDER_PREFIX} {message}")
}

/// Compose the message returned when a command did not complete within its
/// time budget.
///
/// With detector hits: the detection report followed by the framed screen.
/// Without: a generic timeout header, the framed screen, and the fixed
/// possible-causes / suggested-actions block.
pub fn format_timeout_message(
    timeout_ms: u64,
    terminal_screen: &str,
    detections: &[DetectionResult],
) -> String {
    let framed = format_terminal_screen(terminal_screen);

    if !detections.is_empty() {
        let report = format_detection_results(detections);
        return format!("{report}\n\n{framed}");
    }

    let header = format!(
        "{TIMEOUT_PREFIX} Command timed out after {timeout_ms}ms. The process may still be running."
    );

    let reminder = [
        "[POSSIBLE CAUSES]",
        "• The command is still executing (long-running process)",
        "• The process is waiting for input not detected by pattern matching",
        "• The process is stuck or hanging",
        "",
        "[SUGGESTED ACTIONS]",
        "• Use shell_interact('<Ctrl+C>') to interrupt",
        "• Use shell_interact('<Enter>') if it might be waiting for confirmation",
        "• Check the terminal screen above for any prompts or messages",
        "• If the process should continue, increase timeout_ms parameter",
    ]
    .join("\n");

    format!("{header}\n\n{framed}\n\n{reminder}")
}

/// Compose the message returned when a command was launched with a trailing
/// `&` and the foreground wrapper line has already completed.
pub fn format_background_message(terminal_screen: &str) -> String {
    let framed = format_terminal_screen(terminal_screen);
    let reminder = format_system_reminder(
        "The process is running in the background. \
         Use shell_interact to check status or send signals.",
    );
    format!("{BACKGROUND_PREFIX}\n\n{framed}\n\n{reminder}")
}
