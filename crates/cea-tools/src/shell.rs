//! `shell_execute` / `shell_interact` — terminal tools over the shared
//! session.
//!
//! One terminal session per process, shared by both tools so environment,
//! working directory, and running jobs persist between calls. The
//! process-wide handle lives behind a mutex that also serializes
//! invocations — the session itself is not thread-safe by contract.

use crate::{Tool, ToolResult};
use async_trait::async_trait;
use cea_terminal::format::{format_background_message, NO_VISIBLE_OUTPUT};
use cea_terminal::keys::parse_keys;
use cea_terminal::session::{is_background_command, SharedSession};
use cea_terminal::truncate::{truncate_output, MAX_OUTPUT_CHARS};
use cea_terminal::types::{ExecOptions, SendKeysOptions};
use cea_terminal::{Result, TerminalError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::info;

/// Process-wide storage for the shared terminal session.
static SHARED_SESSION: OnceLock<Mutex<Option<SharedSession>>> = OnceLock::new();

fn session_lock() -> &'static Mutex<Option<SharedSession>> {
    SHARED_SESSION.get_or_init(|| Mutex::new(None))
}

/// Return a live session from the locked slot, creating or replacing one
/// as needed. A session whose pane has disappeared is silently replaced.
async fn ensure_session(slot: &mut Option<SharedSession>) -> Result<&SharedSession> {
    let recreate = match slot.as_ref() {
        Some(session) => !session.is_alive().await,
        None => true,
    };

    if recreate {
        *slot = Some(SharedSession::create(None).await?);
    }

    slot.as_ref()
        .ok_or_else(|| TerminalError::SessionNotFound("shared session".to_string()))
}

// ---------------------------------------------------------------------------
// shell_execute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCommandArgs {
    /// The shell command to execute.
    pub command: String,

    /// Absolute path to run the command in.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Timeout in milliseconds (default 10000).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    pub output: String,
}

/// Run a command in the shared session and return its sanitized, truncated
/// output.
///
/// Commands launched with a trailing `&` come back framed as a background
/// notice pointing the agent at `shell_interact` for follow-up.
pub async fn run_command(args: &RunCommandArgs) -> Result<CommandResult> {
    let mut slot = session_lock().lock().await;
    let session = ensure_session(&mut slot).await?;

    let options = ExecOptions {
        workdir: args.workdir.clone(),
        timeout_ms: args.timeout_ms.unwrap_or_else(|| ExecOptions::default().timeout_ms),
    };

    let outcome = session.execute_command(&args.command, &options).await?;

    let output = truncate_output(&outcome.output, MAX_OUTPUT_CHARS);
    let output = if outcome.exit_code == 0 && is_background_command(&args.command) {
        format_background_message(&output)
    } else {
        output
    };

    Ok(CommandResult {
        exit_code: outcome.exit_code,
        output,
    })
}

pub struct ShellExecuteTool;

#[async_trait]
impl Tool for ShellExecuteTool {
    fn name(&self) -> &str {
        "shell_execute"
    }

    fn description(&self) -> &str {
        "Run a shell command and capture output. \
         For long-running processes (servers, etc.), use '&' to run in background. \
         Commands run in a shared terminal session, so environment persists between calls."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "workdir": {
                    "type": "string",
                    "description": "Absolute path for command execution"
                },
                "timeout_ms": {
                    "type": "number",
                    "description": "Timeout in milliseconds (default: 10000)"
                }
            },
            "required": ["command"]
        })
    }

    fn needs_approval(&self) -> bool {
        true
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let args: RunCommandArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolResult::error(format!("invalid shell_execute input: {e}")),
        };

        match run_command(&args).await {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(json) => ToolResult::success(json),
                Err(e) => ToolResult::error(format!("result serialization failed: {e}")),
            },
            Err(e) => ToolResult::error(format!("{}: {e}", e.code())),
        }
    }
}

// ---------------------------------------------------------------------------
// shell_interact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendKeysArgs {
    /// Keystrokes to send. Use <SpecialKey> syntax for special keys.
    /// Example: 'yes<Enter>', '<Ctrl+C>', 'n<Enter>'.
    pub keystrokes: String,

    /// Time to wait after sending keys in ms (default 500).
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractResult {
    pub success: bool,
    pub output: String,
}

/// Send keystrokes to the shared session and return the screen afterwards.
pub async fn send_keystrokes(args: &SendKeysArgs) -> Result<InteractResult> {
    let mut slot = session_lock().lock().await;
    let session = ensure_session(&mut slot).await?;

    let keys = parse_keys(&args.keystrokes);
    let options = SendKeysOptions {
        block: false,
        min_timeout_ms: args.duration.unwrap_or_else(|| SendKeysOptions::default().min_timeout_ms),
    };

    let screen = session.send_keys(&keys, &options).await?;
    let output = if screen.is_empty() {
        NO_VISIBLE_OUTPUT.to_string()
    } else {
        screen
    };

    Ok(InteractResult {
        success: true,
        output,
    })
}

pub struct ShellInteractTool;

#[async_trait]
impl Tool for ShellInteractTool {
    fn name(&self) -> &str {
        "shell_interact"
    }

    fn description(&self) -> &str {
        "Send keystrokes to the shared terminal session. \
         Use this for interactive prompts (y/n), navigation, or when shell_execute fails due to input requirement. \
         Special keys: <Enter>, <Tab>, <Escape>, <Up>, <Down>, <Left>, <Right>, \
         <Ctrl+C>, <Ctrl+D>, <Ctrl+Z>, <Ctrl+L>, <Backspace>, <Delete>, <Home>, <End>. \
         Example: 'y<Enter>' to answer yes, '<Ctrl+C>' to interrupt, '<Up><Enter>' to repeat last command."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "keystrokes": {
                    "type": "string",
                    "description": "Keystrokes to send. Use <SpecialKey> syntax for special keys. \
                                    Example: 'yes<Enter>', '<Ctrl+C>', 'n<Enter>'"
                },
                "duration": {
                    "type": "number",
                    "description": "Time to wait after sending keys in ms (default: 500)"
                }
            },
            "required": ["keystrokes"]
        })
    }

    fn needs_approval(&self) -> bool {
        true
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let args: SendKeysArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolResult::error(format!("invalid shell_interact input: {e}")),
        };

        match send_keystrokes(&args).await {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(json) => ToolResult::success(json),
                Err(e) => ToolResult::error(format!("result serialization failed: {e}")),
            },
            Err(e) => ToolResult::error(format!("{}: {e}", e.code())),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Kill the shared session (if any) and clear the stored handle.
///
/// Idempotent and safe to call when no session was ever created. Wired to
/// graceful shutdown and test teardown; skipping it leaks the tmux session.
pub async fn cleanup_session() {
    let mut slot = session_lock().lock().await;
    if let Some(session) = slot.take() {
        info!(session = %session.id(), "cleaning up shared terminal session");
        session.cleanup().await;
    }
}

/// Wait for Ctrl-C, then clean up the shared session.
///
/// The host loop spawns this once so an interrupted process does not leave
/// an orphaned tmux session behind:
///
/// ```rust,no_run
/// tokio::spawn(cea_tools::shell::cleanup_on_ctrl_c());
/// ```
pub async fn cleanup_on_ctrl_c() {
    if tokio::signal::ctrl_c().await.is_ok() {
        cleanup_session().await;
    }
}
