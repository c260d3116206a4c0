//! File writing tools: write_file, create_and_write_file, append_file, create_file

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::{check_encoding, require_str, resolve_path_arg};

fn write_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "File path relative to the working directory"
            },
            "content": {
                "type": "string",
                "description": "Text content to write"
            },
            "encoding": {
                "type": "string",
                "description": "Text encoding (only utf-8 is supported)"
            }
        },
        "required": ["path", "content"]
    })
}

/// Shared by write_file and its create_and_write_file alias
///
/// Creates or overwrites. There is no partial-write recovery: a failure
/// mid-write leaves the file in an undefined state.
async fn write_file_impl(input: Value, ctx: &ToolContext) -> ToolResult {
    let path = match resolve_path_arg(&input, "path", ctx) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let content = match require_str(&input, "content") {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = check_encoding(&input) {
        return e;
    }

    match tokio::fs::write(&path, content).await {
        Ok(()) => ToolResult::success(format!("File written to {}", display_arg(&input))),
        Err(e) => ToolResult::error(format!("Failed to write {}: {}", path.display(), e)),
    }
}

/// The path as the model supplied it, for result messages
fn display_arg(input: &Value) -> &str {
    input["path"].as_str().unwrap_or("")
}

/// Create or overwrite a file with the given content
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Create or overwrite a file with the given text content."
    }

    fn input_schema(&self) -> Value {
        write_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "WriteFileTool::execute: called");
        write_file_impl(input, ctx).await
    }
}

/// Alias of write_file kept for models that ask to "create and write"
pub struct CreateAndWriteFileTool;

#[async_trait]
impl Tool for CreateAndWriteFileTool {
    fn name(&self) -> &'static str {
        "create_and_write_file"
    }

    fn description(&self) -> &'static str {
        "Create a file and write text content to it, overwriting any existing content."
    }

    fn input_schema(&self) -> Value {
        write_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CreateAndWriteFileTool::execute: called");
        write_file_impl(input, ctx).await
    }
}

/// Append text content to a file
pub struct AppendFileTool;

#[async_trait]
impl Tool for AppendFileTool {
    fn name(&self) -> &'static str {
        "append_file"
    }

    fn description(&self) -> &'static str {
        "Append text content to the end of a file, creating it if absent."
    }

    fn input_schema(&self) -> Value {
        write_schema()
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "AppendFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let content = match require_str(&input, "content") {
            Ok(c) => c,
            Err(e) => return e,
        };
        if let Err(e) = check_encoding(&input) {
            return e;
        }

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            tokio::io::AsyncWriteExt::write_all(&mut file, content.as_bytes()).await
        }
        .await;

        match result {
            Ok(()) => ToolResult::success(format!("Content appended to {}", display_arg(&input))),
            Err(e) => ToolResult::error(format!("Failed to append to {}: {}", path.display(), e)),
        }
    }
}

/// Create an empty file; fails if the path already exists
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &'static str {
        "create_file"
    }

    fn description(&self) -> &'static str {
        "Create a new empty file. Fails if the path already exists (use write_file to overwrite)."
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
        debug!(?input, "CreateFileTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };

        // create_new is the no-overwrite contract: AlreadyExists if present
        let result = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match result {
            Ok(_) => ToolResult::success(format!("File {} created successfully", display_arg(&input))),
            Err(e) => ToolResult::error(format!("Failed to create {}: {}", path.display(), e)),
        }
    }
}
