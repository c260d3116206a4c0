//! Metadata tools: check_file_exists, get_file_stats

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::SystemTime;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::resolve_path_arg;

/// Boolean existence check
pub struct CheckFileExistsTool;

#[async_trait]
impl Tool for CheckFileExistsTool {
    fn name(&self) -> &'static str {
        "check_file_exists"
    }

    fn description(&self) -> &'static str {
        "Check whether a file or directory exists. Absence is the expected false result, not an error."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the working directory"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CheckFileExistsTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        ToolResult::success_json(&serde_json::json!(path.exists()))
    }
}

/// File/directory metadata
pub struct GetFileStatsTool;

fn to_rfc3339(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

#[cfg(unix)]
fn permissions_octal(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions_octal(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "644".to_string()
    }
}

#[async_trait]
impl Tool for GetFileStatsTool {
    fn name(&self) -> &'static str {
        "get_file_stats"
    }

    fn description(&self) -> &'static str {
        "Return size, creation and modification times, file/directory flags, and permission bits."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the working directory"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetFileStatsTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => return ToolResult::error(format!("Failed to stat {}: {}", path.display(), e)),
        };

        let stats = serde_json::json!({
            "size": metadata.len(),
            "created": to_rfc3339(metadata.created()),
            "modified": to_rfc3339(metadata.modified()),
            "isFile": metadata.is_file(),
            "isDirectory": metadata.is_dir(),
            "permissions": permissions_octal(&metadata),
        });

        ToolResult::success_json(&stats)
    }
}
