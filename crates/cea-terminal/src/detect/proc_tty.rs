//! Kernel proc-filesystem strategy: is the foreground process blocked in a
//! tty read?
//!
//! On hosts with a per-process kernel filesystem (`/proc`), the wait
//! channel of the pane's foreground process states *exactly* what it is
//! sleeping on. A tty read channel is the most direct evidence available
//! that the session wants input. No-op everywhere else.

use super::{run_capture, DetectionContext, Detector};
use crate::types::{Confidence, DetectionMethod, DetectionResult};
use async_trait::async_trait;
use std::path::Path;

/// Wait channels that mean "blocked reading the terminal".
const TTY_READ_CHANNELS: &[&str] = &["n_tty_read", "tty_read", "read_chan"];

/// Generic sleep channel seen for tty waits on newer kernels; weaker
/// evidence on its own.
const GENERIC_WAIT_CHANNEL: &str = "wait_woken";

pub struct ProcTtyDetector;

#[async_trait]
impl Detector for ProcTtyDetector {
    fn needs_pane(&self) -> bool {
        true
    }

    async fn probe(&self, ctx: &DetectionContext<'_>) -> Option<DetectionResult> {
        if !Path::new("/proc").is_dir() {
            return None;
        }

        let pane = ctx.pane?;
        let tty = pane.pane_tty().await.ok()?;
        let tty = tty.trim().strip_prefix("/dev/").unwrap_or(tty.trim()).to_string();

        let ps_out = run_capture("ps", &["-t", &tty, "-o", "pid,stat"]).await?;
        let pid = foreground_pid(&ps_out)?;

        let wchan = tokio::fs::read_to_string(format!("/proc/{pid}/wchan"))
            .await
            .ok()?;
        let wchan = wchan.trim();

        let confidence = if TTY_READ_CHANNELS.iter().any(|c| wchan.contains(c)) {
            Confidence::High
        } else if wchan == GENERIC_WAIT_CHANNEL {
            Confidence::Medium
        } else {
            return None;
        };

        Some(DetectionResult {
            method: DetectionMethod::ProcTtyWait,
            confidence,
            detail: format!("Foreground process {pid} is blocked in kernel wait channel \"{wchan}\""),
            suggested_actions: vec![
                "Process is waiting for TTY input (detected via /proc)".to_string(),
                "Check terminal screen for prompts".to_string(),
                "Use <Ctrl+C> to interrupt if stuck".to_string(),
            ],
        })
    }
}

/// Pid of the last foreground (`+`) entry of `ps -o pid,stat` output.
fn foreground_pid(ps_output: &str) -> Option<u32> {
    ps_output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid: u32 = fields.next()?.parse().ok()?;
            let stat = fields.next()?;
            stat.contains('+').then_some(pid)
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_pid_parses() {
        let ps = "  PID STAT\n 4242 Ss\n 4243 S+\n";
        assert_eq!(foreground_pid(ps), Some(4243));
    }

    #[test]
    fn no_foreground_process() {
        let ps = "  PID STAT\n 4242 Ss\n";
        assert_eq!(foreground_pid(ps), None);
    }

    #[test]
    fn tty_channels_rank_above_generic_wait() {
        assert!(TTY_READ_CHANNELS.contains(&"n_tty_read"));
        assert_ne!(GENERIC_WAIT_CHANNEL, "n_tty_read");
    }
}
