//! Tmux control channel.
//!
//! Thin async wrapper over the `tmux` binary. The session pane is the
//! virtual terminal buffer everything else reads from and writes to; this
//! module is the only place that shells out to tmux.
//!
//! Every control call is raced against a fixed time bound so an
//! unresponsive tmux server can never hang the caller's poll loop.

use crate::error::{Result, TerminalError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Upper bound on any single tmux control invocation.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Pane geometry for new sessions. Wide enough that marker lines rarely
/// wrap, which keeps the sanitizer's fragment handling a fallback rather
/// than the common path.
const PANE_COLS: &str = "200";
const PANE_ROWS: &str = "50";

/// Handle to one tmux session's single pane.
#[derive(Debug, Clone)]
pub struct TmuxPane {
    name: String,
}

impl TmuxPane {
    /// Check whether tmux is installed and runnable.
    pub async fn available() -> bool {
        run_tmux(&["-V"]).await.map(|o| o.status.success()).unwrap_or(false)
    }

    /// Create a new detached session named `name` with its pane bound to
    /// `cwd`. Fails fatally when tmux is missing or session creation fails.
    pub async fn create(name: &str, cwd: &Path) -> Result<Self> {
        if !Self::available().await {
            return Err(TerminalError::MuxUnavailable);
        }

        // A stale session with this name would make new-session fail.
        let _ = run_tmux(&["kill-session", "-t", name]).await;

        let cwd_str = cwd.to_string_lossy();
        let output = run_tmux(&[
            "new-session",
            "-d",
            "-s",
            name,
            "-x",
            PANE_COLS,
            "-y",
            PANE_ROWS,
            "-c",
            &cwd_str,
        ])
        .await
        .map_err(|e| TerminalError::MuxSpawn(e.to_string()))?;

        if !output.status.success() {
            return Err(TerminalError::MuxSpawn(format!(
                "new-session exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(session = name, cwd = %cwd_str, "created tmux session");
        Ok(Self { name: name.to_string() })
    }

    /// Handle to an existing session by name, without creating anything.
    /// The session may or may not exist; check with [`TmuxPane::exists`].
    pub fn attach(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    /// The tmux session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session still exists on the server.
    pub async fn exists(&self) -> bool {
        run_tmux(&["has-session", "-t", &self.name])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Send `text` as literal input (no key-name interpretation).
    pub async fn send_literal(&self, text: &str) -> Result<()> {
        self.checked(&["send-keys", "-t", &self.name, "-l", text], "send-keys -l")
            .await
    }

    /// Send a single tmux key name (e.g. `Enter`, `C-c`, `Up`).
    pub async fn send_named_key(&self, key: &str) -> Result<()> {
        self.checked(&["send-keys", "-t", &self.name, key], "send-keys").await
    }

    /// Send a full command line: literal text followed by Enter.
    pub async fn send_line(&self, text: &str) -> Result<()> {
        self.send_literal(text).await?;
        self.send_named_key("Enter").await
    }

    /// Capture the pane's text. With `scrollback`, includes the entire
    /// history (`-S -`); otherwise only the visible screen.
    pub async fn capture(&self, scrollback: bool) -> Result<String> {
        let output = if scrollback {
            self.output(&["capture-pane", "-p", "-t", &self.name, "-S", "-"], "capture-pane")
                .await?
        } else {
            self.output(&["capture-pane", "-p", "-t", &self.name], "capture-pane").await?
        };
        Ok(output)
    }

    /// Expand a tmux format string for this pane (`display-message -p`).
    pub async fn display(&self, format: &str) -> Result<String> {
        let out = self
            .output(&["display-message", "-p", "-t", &self.name, format], "display-message")
            .await?;
        Ok(out.trim().to_string())
    }

    /// Current cursor coordinates as (x, y), y relative to the visible pane.
    pub async fn cursor_position(&self) -> Result<(usize, usize)> {
        let raw = self.display("#{cursor_x},#{cursor_y}").await?;
        let mut parts = raw.splitn(2, ',');
        let parse = |s: Option<&str>| -> Result<usize> {
            s.and_then(|v| v.trim().parse().ok()).ok_or_else(|| TerminalError::MuxCommand {
                command: "display-message".into(),
                reason: format!("unparsable cursor position {raw:?}"),
            })
        };
        Ok((parse(parts.next())?, parse(parts.next())?))
    }

    /// Path of the tty device backing the pane (e.g. `/dev/ttys004`).
    pub async fn pane_tty(&self) -> Result<String> {
        let tty = self.display("#{pane_tty}").await?;
        if tty.is_empty() {
            return Err(TerminalError::MuxCommand {
                command: "display-message".into(),
                reason: "empty pane_tty".into(),
            });
        }
        Ok(tty)
    }

    /// Kill the session. Idempotent: a missing session is not an error.
    pub async fn kill(&self) {
        match run_tmux(&["kill-session", "-t", &self.name]).await {
            Ok(out) if !out.status.success() => {
                debug!(session = %self.name, "kill-session: session already gone");
            }
            Ok(_) => debug!(session = %self.name, "killed tmux session"),
            Err(e) => warn!(session = %self.name, error = %e, "kill-session failed"),
        }
    }

    /// Run a tmux subcommand, requiring exit status 0.
    async fn checked(&self, args: &[&str], what: &str) -> Result<()> {
        let output = run_tmux(args).await?;
        if !output.status.success() {
            return Err(TerminalError::MuxCommand {
                command: what.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Run a tmux subcommand, requiring success, returning stdout as text.
    async fn output(&self, args: &[&str], what: &str) -> Result<String> {
        let output = run_tmux(args).await?;
        if !output.status.success() {
            return Err(TerminalError::MuxCommand {
                command: what.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Spawn `tmux <args>` with a hard time bound and collect its output.
async fn run_tmux(args: &[&str]) -> Result<std::process::Output> {
    let fut = Command::new("tmux")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match tokio::time::timeout(CONTROL_TIMEOUT, fut).await {
        Ok(result) => result.map_err(TerminalError::Io),
        Err(_elapsed) => Err(TerminalError::MuxCommand {
            command: args.first().copied().unwrap_or("tmux").to_string(),
            reason: format!("control call exceeded {}s", CONTROL_TIMEOUT.as_secs()),
        }),
    }
}
