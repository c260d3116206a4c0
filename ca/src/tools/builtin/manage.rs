//! File management tools: delete_file, rename_file, copy_file

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::resolve_path_arg;

/// Delete a single file
pub struct DeleteFileTool;

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn description(&self) -> &'static str {
        "Delete a file. Fails if the path is missing or is a directory."
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
        debug!(?input, "DeleteFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => ToolResult::success(format!("File {} deleted", input["path"].as_str().unwrap_or(""))),
            Err(e) => ToolResult::error(format!("Failed to delete {}: {}", path.display(), e)),
        }
    }
}

/// Rename or move a file or directory
pub struct RenameFileTool;

#[async_trait]
impl Tool for RenameFileTool {
    fn name(&self) -> &'static str {
        "rename_file"
    }

    fn description(&self) -> &'static str {
        "Rename or move a file or directory within the working directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "old_path": {
                    "type": "string",
                    "description": "Existing path relative to the working directory"
                },
                "new_path": {
                    "type": "string",
                    "description": "Target path relative to the working directory"
                }
            },
            "required": ["old_path", "new_path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "RenameFileTool::execute: called");
        let old_path = match resolve_path_arg(&input, "old_path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let new_path = match resolve_path_arg(&input, "new_path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match tokio::fs::rename(&old_path, &new_path).await {
            Ok(()) => ToolResult::success(format!(
                "Renamed {} to {}",
                input["old_path"].as_str().unwrap_or(""),
                input["new_path"].as_str().unwrap_or("")
            )),
            Err(e) => ToolResult::error(format!("Failed to rename {}: {}", old_path.display(), e)),
        }
    }
}

/// Copy a file, honoring an overwrite flag
pub struct CopyFileTool;

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &'static str {
        "copy_file"
    }

    fn description(&self) -> &'static str {
        "Copy a file. With overwrite disabled the copy fails before touching an existing destination."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "Source file path relative to the working directory"
                },
                "destination": {
                    "type": "string",
                    "description": "Destination path relative to the working directory"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace an existing destination (default: true)"
                }
            },
            "required": ["source", "destination"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CopyFileTool::execute: called");
        let source = match resolve_path_arg(&input, "source", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let destination = match resolve_path_arg(&input, "destination", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let overwrite = input["overwrite"].as_bool().unwrap_or(true);

        // Checked before any copy so a refused overwrite cannot leave a
        // partial destination behind
        if !overwrite && destination.exists() {
            return ToolResult::error(format!(
                "{} already exists",
                input["destination"].as_str().unwrap_or("")
            ));
        }

        match tokio::fs::copy(&source, &destination).await {
            Ok(_) => ToolResult::success(format!(
                "Copied {} to {}",
                input["source"].as_str().unwrap_or(""),
                input["destination"].as_str().unwrap_or("")
            )),
            Err(e) => ToolResult::error(format!("Failed to copy {}: {}", source.display(), e)),
        }
    }
}
