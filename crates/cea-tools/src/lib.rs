//! cea-tools — agent-facing shell tools over the shared terminal session.
//!
//! Defines the `Tool` trait the model-invocation loop consumes, plus the
//! two terminal tools: `shell_execute` (run a command, capture output) and
//! `shell_interact` (send raw keystrokes). Both are side-effecting and
//! report `needs_approval`, leaving the approve/deny decision to the host
//! loop.
//!
//! The process-wide shared session lives here too: created lazily on the
//! first tool call, revalidated per call, torn down by
//! [`shell::cleanup_session`] on shutdown paths.

pub mod shell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text content returned to the model.
    pub content: String,
    /// Whether the tool execution failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

/// Trait that all tools implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name for this tool (e.g. "shell_execute").
    fn name(&self) -> &str;
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;
    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;
    /// Whether the host loop must obtain approval before executing.
    fn needs_approval(&self) -> bool {
        false
    }
    /// Execute the tool with the given input.
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// All tools provided by this crate.
pub fn tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(shell::ShellExecuteTool),
        Box::new(shell::ShellInteractTool),
    ]
}
