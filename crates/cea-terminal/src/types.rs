//! Shared data types for cea-terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Confidence / DetectionMethod / DetectionResult
// ---------------------------------------------------------------------------

/// Three-level ranking of how certain a heuristic is that the terminal is
/// blocked on user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Sort rank: high sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Confidence::High => 0,
            Confidence::Medium => 1,
            Confidence::Low => 2,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(s)
    }
}

/// Which detection strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    RegexPattern,
    ProcessState,
    CursorAtPrompt,
    ProcTtyWait,
    OutputStall,
    LastLinePrompt,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectionMethod::RegexPattern => "regex_pattern",
            DetectionMethod::ProcessState => "process_state",
            DetectionMethod::CursorAtPrompt => "cursor_at_prompt",
            DetectionMethod::ProcTtyWait => "proc_tty_wait",
            DetectionMethod::OutputStall => "output_stall",
            DetectionMethod::LastLinePrompt => "last_line_prompt",
        };
        f.write_str(s)
    }
}

/// One heuristic's verdict that the session is waiting on user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// The strategy that fired.
    pub method: DetectionMethod,

    /// How certain the strategy is.
    pub confidence: Confidence,

    /// Human-readable explanation of what was observed.
    pub detail: String,

    /// Ordered remedial actions the agent can take (keystroke syntax).
    pub suggested_actions: Vec<String>,
}

// ---------------------------------------------------------------------------
// CommandOutcome / options
// ---------------------------------------------------------------------------

/// Result of one `SharedSession::execute_command` invocation.
///
/// A timeout is *not* an error: `exit_code` is `-1` and `output` carries a
/// diagnosis the agent can act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Exit code embedded in the end marker (0 = success, -1 = timed out).
    pub exit_code: i32,

    /// Sanitized text captured between the command's start and end markers,
    /// or a timeout guidance message.
    pub output: String,
}

/// Knobs for `SharedSession::execute_command`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Directory to `cd` into before running the command. The change
    /// persists in the session afterwards, like it would for a human.
    pub workdir: Option<PathBuf>,

    /// How long to wait for the end marker before giving up and running
    /// interactive-state detection. The underlying command keeps running
    /// in the session after a timeout.
    pub timeout_ms: u64,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            workdir: None,
            timeout_ms: 10_000,
        }
    }
}

/// Knobs for `SharedSession::send_keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendKeysOptions {
    /// When `true`, keep waiting (up to a fixed cap) until the screen
    /// content stops changing between samples.
    pub block: bool,

    /// Minimum time to wait after sending before capturing the screen.
    pub min_timeout_ms: u64,
}

impl Default for SendKeysOptions {
    fn default() -> Self {
        Self {
            block: false,
            min_timeout_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// InteractiveProbe
// ---------------------------------------------------------------------------

/// Answer to "is this session blocked on user input right now?".
///
/// Fail-closed: when the session cannot be queried at all, `is_interactive`
/// is `true` with an explanatory `reason`, never a silent "idle".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveProbe {
    pub is_interactive: bool,

    /// Reason code: `session-unreachable`, the firing method name, or
    /// `no-detection`.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rank_orders_high_first() {
        assert!(Confidence::High.rank() < Confidence::Medium.rank());
        assert!(Confidence::Medium.rank() < Confidence::Low.rank());
    }

    #[test]
    fn exec_options_default_timeout() {
        let opts = ExecOptions::default();
        assert_eq!(opts.timeout_ms, 10_000);
        assert!(opts.workdir.is_none());
    }

    #[test]
    fn detection_method_serializes_snake_case() {
        let json = serde_json::to_string(&DetectionMethod::RegexPattern).unwrap();
        assert_eq!(json, "\"regex_pattern\"");
    }
}
