//! Process-state strategy: inspect the pane tty's foreground process.
//!
//! A sleeping foreground process whose executable is known to block on
//! input (shells, ssh, sudo, package managers) is a strong hint that the
//! session is waiting for a human. Unix-only; every probe failure is a
//! clean "no result".

use super::{run_capture, DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;

/// Executables that routinely stop and wait for terminal input.
const INTERACTIVE_CANDIDATES: &[&str] = &[
    "bash", "sh", "zsh", "apt", "apt-get", "dpkg", "yum", "pacman", "ssh", "sudo",
];

pub struct ProcessStateDetector;

#[async_trait]
impl Detector for ProcessStateDetector {
    fn needs_pane(&self) -> bool {
        true
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        let pane = ctx.pane?;
        let tty = pane.pane_tty().await.ok()?;
        let tty = tty.trim().strip_prefix("/dev/").unwrap_or(tty.trim()).to_string();

        let ps_out = run_capture("ps", &["-t", &tty, "-o", "pid,stat,comm"]).await?;
        let (stat, comm) = foreground_entry(&ps_out)?;

        let is_sleeping = stat.contains('S');
        let is_candidate = INTERACTIVE_CANDIDATES.contains(&comm.as_str());

        if is_sleeping && is_candidate {
            return Some(DetectionResult {
                method: DetectionMethod::ProcessState,
                confidence: Confidence::Medium,
                detail: format!(
                    "Foreground process \"{comm}\" is sleeping (state: {stat}) - may be waiting for input"
                ),
                suggested_actions: vec![
                    "Check terminal screen for prompts".to_string(),
                    "Try <Enter> if prompt expects input".to_string(),
                    "Use <Ctrl+C> to interrupt if stuck".to_string(),
                ],
            });
        }
        None
    }
}

/// The last foreground (`+` state flag) entry of `ps -o pid,stat,comm`
/// output, as (stat, comm).
fn foreground_entry(ps_output: &str) -> Option<(String, String)> {
    ps_output
        .lines()
        .skip(1) // header
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _pid = fields.next()?;
            let stat = fields.next()?;
            let comm = fields.next()?;
            stat.contains('+').then(|| (stat.to_string(), comm.to_string()))
        })
        .last()
}
