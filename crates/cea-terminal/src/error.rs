//! Error types for the cea-terminal crate.

use thiserror::Error;

/// All errors that can originate from terminal operations.
///
/// Only control-channel failures are surfaced as errors. Command timeouts
/// and non-zero exits are *data* — they come back inside `CommandOutcome`
/// so the calling agent can read and act on them.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The tmux binary is not installed or not on PATH.
    #[error("tmux is not available on this host")]
    MuxUnavailable,

    /// Session creation failed (tmux new-session exited non-zero or could
    /// not be spawned).
    #[error("failed to create terminal session: {0}")]
    MuxSpawn(String),

    /// A tmux control command failed or exceeded its internal time bound.
    #[error("tmux {command} failed: {reason}")]
    MuxCommand { command: String, reason: String },

    /// The requested session no longer exists.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Underlying I/O failure while driving a subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerminalError {
    /// Short machine-readable reason code for callers that report errors
    /// as structured text rather than propagating them.
    pub fn code(&self) -> &'static str {
        match self {
            TerminalError::MuxUnavailable => "MUX_UNAVAILABLE",
            TerminalError::MuxSpawn(_) => "MUX_SPAWN_FAILED",
            TerminalError::MuxCommand { .. } => "MUX_COMMAND_FAILED",
            TerminalError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            TerminalError::Io(_) => "IO_ERROR",
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, TerminalError>;
