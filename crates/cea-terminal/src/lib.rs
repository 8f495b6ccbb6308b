//! cea-terminal — a persistent tmux-backed shell session for autonomous
//! agents.
//!
//! The agent drives one long-lived terminal pane the way a human operator
//! would: commands keep their environment between calls, background jobs
//! survive the call that started them, and a command stuck on a password
//! prompt comes back as a readable diagnosis instead of a hang.
//!
//! The moving parts:
//! - [`session::SharedSession`] — owns the pane, wraps commands in
//!   single-use boundary markers, polls for completion;
//! - [`detect`] — heuristic ensemble answering "is this session blocked on
//!   user input?";
//! - [`sanitize`] / [`format`] / [`truncate`] — keep the marker protocol
//!   and unbounded output away from the caller;
//! - [`keys`] — `y<Enter>`-style keystroke syntax → tmux key tokens;
//! - [`tmux`] — the one place that shells out to the multiplexer.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use cea_terminal::session::SharedSession;
//! use cea_terminal::types::ExecOptions;
//!
//! #[tokio::main]
//! async fn main() -> cea_terminal::Result<()> {
//!     let session = SharedSession::create(None).await?;
//!
//!     let outcome = session.execute_command("echo hello", &ExecOptions::default()).await?;
//!     println!("[{}] {}", outcome.exit_code, outcome.output);
//!
//!     session.cleanup().await;
//!     Ok(())
//! }
//! ```

pub mod detect;
pub mod error;
pub mod format;
pub mod keys;
pub mod markers;
pub mod sanitize;
pub mod session;
pub mod tmux;
pub mod truncate;
pub mod types;

pub use error::{Result, TerminalError};
pub use types::{
    CommandOutcome, Confidence, DetectionMethod, DetectionResult, ExecOptions, InteractiveProbe,
    SendKeysOptions,
};
