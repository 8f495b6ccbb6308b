//! Shared terminal session: one persistent tmux pane driven like a human
//! operator would.
//!
//! Commands are wrapped in unique markers, sent as literal keystrokes, and
//! found again by polling the pane's scrollback. On timeout the session
//! asks the detector ensemble for a diagnosis instead of hanging. The
//! underlying command keeps running after a timeout — later calls can still
//! interact with it, which is what makes background workflows possible.
//!
//! The session is not thread-safe: callers must serialize
//! `execute_command` / `send_keys` invocations against it. The tool layer
//! does this with a mutex; direct library users are on their own.

use crate::detect::{detect_interactive_prompt, DetectionContext};
use crate::error::Result;
use crate::format::format_timeout_message;
use crate::keys::Key;
use crate::markers::{extract_output, find_exit_code, wrap_command, InvocationToken};
use crate::sanitize::strip_internal_markers;
use crate::tmux::TmuxPane;
use crate::types::{CommandOutcome, ExecOptions, SendKeysOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::{debug, info};

/// Fixed gap between scrollback polls while waiting for an end marker.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cap on the extra stabilization wait in `send_keys` with `block`.
const STABILIZE_CAP: Duration = Duration::from_secs(5);

/// Gap between stabilization samples.
const STABILIZE_INTERVAL: Duration = Duration::from_millis(150);

/// A live shared session around one tmux pane.
pub struct SharedSession {
    pane: TmuxPane,
    cwd: PathBuf,
    created_at: u64,
    last_activity: AtomicU64,
}

impl SharedSession {
    /// Create a new session with its pane bound to `cwd` (defaults to the
    /// process working directory).
    ///
    /// Control-channel failure here (tmux missing, session creation
    /// failed) is fatal and propagates.
    pub async fn create(cwd: Option<&Path>) -> Result<Self> {
        let cwd = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let name = format!("cea-term-{}", uuid::Uuid::new_v4().simple());
        let pane = TmuxPane::create(&name, &cwd).await?;

        // History expansion would mangle commands containing `!`.
        pane.send_line("set +H").await?;

        let now = unix_now();
        info!(session = %name, cwd = %cwd.display(), "shared terminal session created");

        Ok(Self {
            pane,
            cwd,
            created_at: now,
            last_activity: AtomicU64::new(now),
        })
    }

    /// The tmux session name identifying this session.
    pub fn id(&self) -> &str {
        self.pane.name()
    }

    /// The directory the session's pane was started in.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Unix timestamp (seconds) of session creation.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Unix timestamp (seconds) of the most recent command or keystroke.
    pub fn last_activity(&self) -> u64 {
        self.last_activity.load(Ordering::Relaxed)
    }

    /// Whether the underlying pane still exists.
    pub async fn is_alive(&self) -> bool {
        self.pane.exists().await
    }

    /// Run `command` in the session and wait for its end marker.
    ///
    /// Returns within `timeout_ms` plus one poll interval, always. On
    /// timeout the outcome carries exit code `-1` and a diagnosis message
    /// instead of command output; the command itself keeps running in the
    /// pane.
    ///
    /// A command with a trailing `&` only launches its background job in
    /// the foreground line, so the call returns as soon as that line
    /// completes — any pid printed (e.g. `echo $!`) comes back as ordinary
    /// output.
    pub async fn execute_command(
        &self,
        command: &str,
        options: &ExecOptions,
    ) -> Result<CommandOutcome> {
        self.touch();

        let token = InvocationToken::next();
        let wrapped = wrap_command(command, options.workdir.as_deref(), &token);

        debug!(session = %self.id(), %token, command, "executing command");
        self.pane.send_line(&wrapped).await?;

        let deadline = Instant::now() + Duration::from_millis(options.timeout_ms);

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let content = self.pane.capture(true).await?;
            if let Some(exit_code) = find_exit_code(&content, &token) {
                let raw = extract_output(&content, &token);
                let output = strip_internal_markers(&raw);
                debug!(session = %self.id(), %token, exit_code, "command completed");
                return Ok(CommandOutcome { exit_code, output });
            }

            if Instant::now() >= deadline {
                return Ok(self.diagnose_timeout(options.timeout_ms).await);
            }
        }
    }

    /// Build the timeout outcome: capture the visible screen, run the
    /// detector ensemble against it, and format the result as guidance.
    async fn diagnose_timeout(&self, timeout_ms: u64) -> CommandOutcome {
        let screen = self.pane.capture(false).await.unwrap_or_default();

        let ctx = DetectionContext {
            content: &screen,
            pane: Some(&self.pane),
        };
        let detections = detect_interactive_prompt(&ctx).await;

        info!(
            session = %self.id(),
            timeout_ms,
            detections = detections.len(),
            "command timed out; returning diagnosis"
        );

        CommandOutcome {
            exit_code: -1,
            output: format_timeout_message(timeout_ms, &screen, &detections),
        }
    }

    /// Send pre-translated keys directly to the pane — no markers, no
    /// completion detection.
    ///
    /// Waits at least `min_timeout_ms` after sending; with `block`, keeps
    /// waiting (bounded) until two consecutive screen samples are
    /// identical. Returns the visible screen content with all marker
    /// protocol text stripped.
    pub async fn send_keys(&self, keys: &[Key], options: &SendKeysOptions) -> Result<String> {
        self.touch();

        for key in keys {
            match key {
                Key::Literal(ch) => self.pane.send_literal(&ch.to_string()).await?,
                Key::Named(name) => self.pane.send_named_key(name).await?,
            }
        }
        debug!(session = %self.id(), count = keys.len(), "sent keys");

        tokio::time::sleep(Duration::from_millis(options.min_timeout_ms)).await;

        if options.block {
            let deadline = Instant::now() + STABILIZE_CAP;
            let mut previous = self.pane.capture(false).await?;
            while Instant::now() < deadline {
                tokio::time::sleep(STABILIZE_INTERVAL).await;
                let current = self.pane.capture(false).await?;
                if current == previous {
                    break;
                }
                previous = current;
            }
        }

        let screen = self.pane.capture(false).await?;
        Ok(strip_internal_markers(&screen))
    }

    /// Current visible screen content, raw.
    pub async fn screen(&self) -> Result<String> {
        self.pane.capture(false).await
    }

    /// Kill the underlying pane. Idempotent; safe when the session is
    /// already gone. Skipping cleanup leaves the tmux session running —
    /// a known leak, which is why the tool layer wires this to shutdown.
    pub async fn cleanup(&self) {
        self.pane.kill().await;
    }

    fn touch(&self) {
        self.last_activity.store(unix_now(), Ordering::Relaxed);
    }
}

/// Whether `command` launches a background job: a trailing `&` that is not
/// part of `&&`.
pub fn is_background_command(command: &str) -> bool {
    let trimmed = command.trim_end();
    trimmed.ends_with('&') && !trimmed.ends_with("&&")
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_detection() {
        assert!(is_background_command("sleep 10 &"));
        assert!(is_background_command("sleep 10 & "));
        assert!(is_background_command("npm run dev &"));
        assert!(!is_background_command("a && b"));
        assert!(!is_background_command("echo hi"));
    }
}
