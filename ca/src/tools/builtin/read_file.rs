//! read_file tool

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::resolve_path_arg;

/// Read a file's text content
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file and return its content as text. Fails if the file is missing or unreadable."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the working directory"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ReadFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(format!("Failed to read {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_returns_content() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), "hello world").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadFileTool.execute(serde_json::json!({"path": "a.txt"}), &ctx).await;

        assert!(!result.is_error);
        assert_eq!(result.content, "hello world");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_error_envelope() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadFileTool.execute(serde_json::json!({"path": "nope.txt"}), &ctx).await;

        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_read_file_outside_root_rejected() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadFileTool
            .execute(serde_json::json!({"path": "../../etc/passwd"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("confinement root"));
    }

    #[tokio::test]
    async fn test_read_file_missing_argument() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadFileTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.is_error);
        assert!(result.content.contains("path is required"));
    }
}
