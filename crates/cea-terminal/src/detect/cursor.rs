//! Cursor-position strategy: a cursor parked at the end of a prompt-shaped
//! line.
//!
//! When a program is waiting for typed input, the cursor usually sits right
//! after text ending in `?`, `:`, `>`, or `]`. Cursor coordinates come from
//! the multiplexer and are relative to the visible screen, so this strategy
//! only makes sense against a visible-screen capture.

use super::{DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static PROMPT_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?:>\]]\s*$").expect("static pattern"));

pub struct CursorDetector;

#[async_trait]
impl Detector for CursorDetector {
    fn needs_pane(&self) -> bool {
        true
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        let pane = ctx.pane?;
        let (cursor_x, cursor_y) = pane.cursor_position().await.ok()?;

        let lines: Vec<&str> = ctx.content.split('\n').collect();
        let current_line = *lines.get(cursor_y)?;

        if current_line.trim().is_empty() {
            return None;
        }

        if cursor_at_line_end(current_line, cursor_x) && PROMPT_TAIL.is_match(current_line) {
            return Some(DetectionResult {
                method: DetectionMethod::CursorAtPrompt,
                confidence: Confidence::Medium,
                detail: format!(
                    "Cursor at position ({cursor_x}, {cursor_y}) appears to be at end of prompt line"
                ),
                suggested_actions: vec![
                    "Terminal may be waiting for input at cursor position".to_string(),
                    "Try responding to the visible prompt".to_string(),
                    "Use <Ctrl+C> if uncertain".to_string(),
                ],
            });
        }
        None
    }
}

/// Whether `cursor_x` (a column index) sits at or past the last visible
/// character. Column counts are characters, not bytes.
fn cursor_at_line_end(line: &str, cursor_x: usize) -> bool {
    let visible_len = line.trim_end().chars().count();
    cursor_x >= visible_len.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_end_detection_counts_characters() {
        assert!(cursor_at_line_end("Password:", 8));
        assert!(cursor_at_line_end("Password:", 9));
        assert!(!cursor_at_line_end("Password:", 3));
        // "héllo sí?" is 9 characters but 11 bytes; the cursor parked on
        // the final `?` is column 8.
        assert!(cursor_at_line_end("héllo sí?", 8));
        assert!(!cursor_at_line_end("héllo sí? and more", 8));
        assert!(cursor_at_line_end("prompt>  ", 6));
    }

    #[test]
    fn prompt_tail_shapes() {
        assert!(PROMPT_TAIL.is_match("Continue?"));
        assert!(PROMPT_TAIL.is_match("Password:"));
        assert!(PROMPT_TAIL.is_match("mysql>"));
        assert!(PROMPT_TAIL.is_match("[Y/n]"));
        assert!(!PROMPT_TAIL.is_match("done."));
    }
}
