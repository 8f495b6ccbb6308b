//! Tool-layer round trip against a real tmux server.
//!
//! The two shell tools share one process-wide session, so everything runs
//! inside a single sequential test to avoid tearing the session down under
//! a concurrent call. Skips (with a note) when tmux is missing.

use cea_tools::shell::{
    cleanup_session, run_command, send_keystrokes, RunCommandArgs, SendKeysArgs,
    ShellExecuteTool, ShellInteractTool,
};
use cea_tools::Tool;

async fn tmux_available() -> bool {
    cea_terminal::tmux::TmuxPane::available().await
}

#[tokio::test]
async fn shared_session_round_trip() {
    if !tmux_available().await {
        eprintln!("tmux not available; skipping");
        return;
    }

    // Plain command through the typed entry point.
    let result = run_command(&RunCommandArgs {
        command: "echo tool-round-trip".to_string(),
        workdir: None,
        timeout_ms: None,
    })
    .await
    .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output, "tool-round-trip");

    // Environment persists into the next call on the same session.
    run_command(&RunCommandArgs {
        command: "export CEA_TOOL_MARKER=shared".to_string(),
        workdir: None,
        timeout_ms: None,
    })
    .await
    .unwrap();
    let result = run_command(&RunCommandArgs {
        command: "echo $CEA_TOOL_MARKER".to_string(),
        workdir: None,
        timeout_ms: None,
    })
    .await
    .unwrap();
    assert_eq!(result.output, "shared");

    // A trailing `&` gets the background framing.
    let result = run_command(&RunCommandArgs {
        command: "sleep 3 &".to_string(),
        workdir: None,
        timeout_ms: None,
    })
    .await
    .unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("[Background process started]"));
    assert!(result.output.contains("shell_interact"));

    // Keystrokes land in the same session.
    let result = send_keystrokes(&SendKeysArgs {
        keystrokes: "echo typed-line".to_string(),
        duration: None,
    })
    .await
    .unwrap();
    assert!(result.success);
    assert!(result.output.contains("echo typed-line"));
    assert!(!result.output.contains("__CEA_"));
    assert!(!result.output.contains("tmux wait"));
    send_keystrokes(&SendKeysArgs {
        keystrokes: "<Ctrl+C>".to_string(),
        duration: None,
    })
    .await
    .unwrap();

    // The JSON tool surface: parse args, run, serialize the result.
    let result = ShellExecuteTool
        .execute(serde_json::json!({"command": "echo via-tool"}))
        .await;
    assert!(!result.is_error);
    let parsed: serde_json::Value = serde_json::from_str(&result.content).unwrap();
    assert_eq!(parsed["exitCode"], 0);
    assert_eq!(parsed["output"], "via-tool");

    let result = ShellInteractTool
        .execute(serde_json::json!({"keystrokes": "<Enter>"}))
        .await;
    assert!(!result.is_error);

    // Malformed input is an error result, not a panic.
    let result = ShellExecuteTool.execute(serde_json::json!({})).await;
    assert!(result.is_error);
    assert!(result.content.contains("invalid shell_execute input"));

    // Teardown is idempotent.
    cleanup_session().await;
    cleanup_session().await;

    // A later call transparently recreates the session.
    let result = run_command(&RunCommandArgs {
        command: "echo recreated".to_string(),
        workdir: None,
        timeout_ms: None,
    })
    .await
    .unwrap();
    assert_eq!(result.output, "recreated");

    cleanup_session().await;
}
