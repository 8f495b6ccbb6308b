//! Output-stall strategy: the screen has stopped changing.
//!
//! Samples the visible pane twice a short interval apart. This strategy
//! only runs on the timeout path — the caller already believes a command is
//! still running — so a frozen screen is evidence of a wait, albeit weak on
//! its own (a long computation prints nothing too).

use super::{DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;
use std::time::Duration;

/// Gap between the two samples.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(300);

pub struct StallDetector;

#[async_trait]
impl Detector for StallDetector {
    fn needs_pane(&self) -> bool {
        true
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        let pane = ctx.pane?;

        let first = pane.capture(false).await.ok()?;
        tokio::time::sleep(SAMPLE_INTERVAL).await;
        let second = pane.capture(false).await.ok()?;

        if first.trim().is_empty() || first != second {
            return None;
        }

        Some(DetectionResult {
            method: DetectionMethod::OutputStall,
            confidence: Confidence::Low,
            detail: format!(
                "Terminal content unchanged across {}ms while a command is assumed running",
                SAMPLE_INTERVAL.as_millis()
            ),
            suggested_actions: vec![
                "Terminal output has stalled - may be waiting for input".to_string(),
                "Check terminal screen for prompts".to_string(),
                "Use <Ctrl+C> to interrupt if stuck".to_string(),
            ],
        })
    }
}
