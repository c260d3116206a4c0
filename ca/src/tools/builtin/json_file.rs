//! Structured JSON read/write tools

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::resolve_path_arg;

/// Read and parse a JSON file
pub struct ReadJsonFileTool;

#[async_trait]
impl Tool for ReadJsonFileTool {
    fn name(&self) -> &'static str {
        "read_json_file"
    }

    fn description(&self) -> &'static str {
        "Read a JSON file and return its parsed content. Parse failures are reported as errors."
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
        debug!(?input, "ReadJsonFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) => return ToolResult::error(format!("Failed to read {}: {}", path.display(), e)),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(data) => ToolResult::success_json(&data),
            Err(e) => ToolResult::error(format!("Failed to parse {} as JSON: {}", path.display(), e)),
        }
    }
}

/// Serialize a JSON value to a file
pub struct WriteJsonFileTool;

#[async_trait]
impl Tool for WriteJsonFileTool {
    fn name(&self) -> &'static str {
        "write_json_file"
    }

    fn description(&self) -> &'static str {
        "Write a JSON value to a file, optionally pretty-printed."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the working directory"
                },
                "data": {
                    "type": "object",
                    "description": "JSON value to write"
                },
                "pretty": {
                    "type": "boolean",
                    "description": "Pretty-print with indentation (default: false)"
                }
            },
            "required": ["path", "data"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "WriteJsonFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let data = match input.get("data") {
            Some(d) => d,
            None => return ToolResult::error("data is required"),
        };
        let pretty = input["pretty"].as_bool().unwrap_or(false);

        let serialized = if pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };
        let text = match serialized {
            Ok(t) => t,
            Err(e) => return ToolResult::error(format!("Failed to serialize JSON: {}", e)),
        };

        match tokio::fs::write(&path, text).await {
            Ok(()) => ToolResult::success(format!("JSON written to {}", input["path"].as_str().unwrap_or(""))),
            Err(e) => ToolResult::error(format!("Failed to write {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read_json() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let write = WriteJsonFileTool
            .execute(
                serde_json::json!({"path": "cfg.json", "data": {"name": "demo", "count": 3}, "pretty": true}),
                &ctx,
            )
            .await;
        assert!(!write.is_error);

        let read = ReadJsonFileTool
            .execute(serde_json::json!({"path": "cfg.json"}), &ctx)
            .await;
        assert!(!read.is_error);
        let parsed: Value = serde_json::from_str(&read.content).unwrap();
        assert_eq!(parsed["name"], "demo");
        assert_eq!(parsed["count"], 3);
    }

    #[tokio::test]
    async fn test_read_invalid_json_is_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("bad.json"), "{not json").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadJsonFileTool
            .execute(serde_json::json!({"path": "bad.json"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("JSON"));
    }

    #[tokio::test]
    async fn test_write_json_missing_data() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = WriteJsonFileTool
            .execute(serde_json::json!({"path": "cfg.json"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("data is required"));
    }
}
