//! run_command: execute shell commands inside the working directory.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::require_str;

/// Execute a shell command under the command policy, rooted at the
/// confinement directory.
pub struct RunCommandTool;

/// Output beyond this is cut to keep context windows sane
const MAX_OUTPUT_CHARS: usize = 30_000;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &'static str {
        "run_command"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command in the working directory. Use for builds, tests, and inspection commands."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "RunCommandTool::execute: called");
        let command = match require_str(&input, "command") {
            Ok(c) => c,
            Err(e) => return e,
        };

        if let Err(reason) = ctx.command_policy.check(command) {
            debug!(%command, %reason, "RunCommandTool::execute: blocked by policy");
            return ToolResult::error(reason);
        }

        // kill_on_drop so a timed-out shell is reaped, not left running
        let output = match tokio::time::timeout(
            ctx.command_timeout,
            tokio::process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(&ctx.root)
                .kill_on_drop(true)
                .output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ToolResult::error(format!("Failed to execute command: {}", e));
            }
            Err(_) => {
                return ToolResult::error(format!(
                    "Command timed out after {}ms",
                    ctx.command_timeout.as_millis()
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let combined = if stdout.is_empty() && !stderr.is_empty() {
            stderr.trim().to_string()
        } else if stderr.is_empty() {
            stdout.trim().to_string()
        } else {
            format!("{}\n\nSTDERR:\n{}", stdout.trim(), stderr.trim())
        };

        let truncated = if combined.len() > MAX_OUTPUT_CHARS {
            let cut = combined
                .char_indices()
                .take_while(|(i, _)| *i < MAX_OUTPUT_CHARS)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            format!(
                "{}...\n[truncated, {} chars total]",
                &combined[..cut],
                combined.len()
            )
        } else {
            combined
        };

        if output.status.success() {
            ToolResult::success(truncated)
        } else {
            debug!(exit_code = ?output.status.code(), "RunCommandTool::execute: command failed");
            ToolResult::error(format!(
                "Exit code: {}\n{}",
                output.status.code().unwrap_or(-1),
                truncated
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CommandPolicy;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_command_basic() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = RunCommandTool
            .execute(serde_json::json!({"command": "echo hello"}), &ctx)
            .await;

        assert!(!result.is_error);
        assert_eq!(result.content, "hello");
    }

    #[tokio::test]
    async fn test_run_command_runs_in_root() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = RunCommandTool.execute(serde_json::json!({"command": "ls"}), &ctx).await;

        assert!(!result.is_error);
        assert!(result.content.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_run_command_failure_reports_exit_code() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = RunCommandTool
            .execute(serde_json::json!({"command": "false"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Exit code: 1"));
    }

    #[tokio::test]
    async fn test_run_command_blocked_by_policy() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = RunCommandTool
            .execute(serde_json::json!({"command": "sudo reboot"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("blocked"));
    }

    #[tokio::test]
    async fn test_run_command_allow_list() {
        let temp = tempdir().unwrap();
        let policy = CommandPolicy::new(vec![], vec!["echo".to_string()]);
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_command_policy(Arc::new(policy));

        let allowed = RunCommandTool
            .execute(serde_json::json!({"command": "echo ok"}), &ctx)
            .await;
        assert!(!allowed.is_error);

        let denied = RunCommandTool
            .execute(serde_json::json!({"command": "ls"}), &ctx)
            .await;
        assert!(denied.is_error);
    }

    #[tokio::test]
    async fn test_run_command_timeout() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_command_timeout(Duration::from_millis(100));

        let result = RunCommandTool
            .execute(serde_json::json!({"command": "sleep 5"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_command_timeout_kills_child() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_command_timeout(Duration::from_millis(50));

        let result = RunCommandTool
            .execute(
                serde_json::json!({"command": "sleep 0.3 && touch after.txt"}),
                &ctx,
            )
            .await;
        assert!(result.is_error);

        // Were the shell left running, the touch would land shortly after
        // the timeout fired
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!temp.path().join("after.txt").exists());
    }

    #[tokio::test]
    async fn test_run_command_missing_command() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = RunCommandTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.is_error);
        assert!(result.content.contains("command"));
    }
}
