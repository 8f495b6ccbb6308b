//! Last-line strategy: context-free fallback on generic prompt shapes.
//!
//! Looks only at the final meaningful line. Deliberately low confidence —
//! plenty of finished commands end in `:` or `]` — and a line that is
//! *only* a bare shell prompt character is excluded outright, because that
//! is what the screen looks like after a command already finished.

use super::{is_bare_prompt_line, last_meaningful_line, DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static PROMPT_SHAPES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let entry = |p: &str, d: &'static str| (Regex::new(p).expect("static pattern"), d);
    vec![
        entry(r"[?:>]\s*$", "Ends with ?, :, or >"),
        entry(r"\]\s*$", "Ends with ] (likely prompt)"),
        entry(r"[$#%]\s*$", "Shell prompt character"),
        entry(r"\(.*\)\s*[?]?\s*$", "Choice in parentheses"),
        entry(r"\.\.\.\s*$", "Ends with ... (waiting indicator)"),
        entry(r">>>\s*$", "Python/REPL prompt"),
        entry(r"(?i)input", "Contains 'input' keyword"),
        entry(r"(?i)enter\s+(your|a|the)", "Prompting for input"),
        entry(r"(?i)waiting", "Contains 'waiting' keyword"),
        entry(r"(?i)press\s+", "Press key prompt"),
        entry(r"(?i)type\s+(your|a|the)", "Type input prompt"),
    ]
});

/// Longest slice of the matched line quoted in the detail text.
const DETAIL_SNIPPET_LEN: usize = 50;

pub struct LastLineDetector;

#[async_trait]
impl Detector for LastLineDetector {
    fn needs_pane(&self) -> bool {
        false
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        let last_line = last_meaningful_line(ctx.content)?;

        for (regex, description) in PROMPT_SHAPES.iter() {
            if !regex.is_match(last_line) {
                continue;
            }

            if is_bare_prompt_line(last_line) {
                // Just "$" (or "#", "%"): the command already finished.
                return None;
            }

            let snippet: String = last_line.chars().take(DETAIL_SNIPPET_LEN).collect();
            let ellipsis = if last_line.chars().count() > DETAIL_SNIPPET_LEN {
                "..."
            } else {
                ""
            };

            return Some(DetectionResult {
                method: DetectionMethod::LastLinePrompt,
                confidence: Confidence::Low,
                detail: format!("Last line analysis: {description}. Line: \"{snippet}{ellipsis}\""),
                suggested_actions: vec![
                    "Inspect the terminal screen for context".to_string(),
                    "If prompted, respond appropriately".to_string(),
                    "Use <Ctrl+C> if command appears stuck".to_string(),
                ],
            });
        }
        None
    }
}
