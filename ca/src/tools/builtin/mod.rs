//! Built-in capabilities advertised to the model

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::{ToolContext, ToolResult};

mod ask_user;
mod directory;
mod json_file;
mod manage;
mod read_file;
mod run_command;
mod stats;
mod system_info;
mod write_file;

pub use ask_user::AskUserTool;
pub use directory::{CreateDirectoryTool, DeleteDirectoryTool, ReadDirectoryTool};
pub use json_file::{ReadJsonFileTool, WriteJsonFileTool};
pub use manage::{CopyFileTool, DeleteFileTool, RenameFileTool};
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use stats::{CheckFileExistsTool, GetFileStatsTool};
pub use system_info::SystemInfoTool;
pub use write_file::{AppendFileTool, CreateAndWriteFileTool, CreateFileTool, WriteFileTool};

/// Extract a required string argument, or the error envelope to return
pub(crate) fn require_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolResult> {
    match input[key].as_str() {
        Some(s) => Ok(s),
        None => Err(ToolResult::error(format!("{} is required", key))),
    }
}

/// Resolve a path argument through confinement
pub(crate) fn resolve_path_arg(input: &Value, key: &str, ctx: &ToolContext) -> Result<PathBuf, ToolResult> {
    let raw = require_str(input, key)?;
    ctx.validate_path(Path::new(raw))
        .map_err(|e| ToolResult::error(e.to_string()))
}

/// Validate the optional `encoding` argument - only utf-8 is supported,
/// anything else is an error envelope rather than a silent fallback
pub(crate) fn check_encoding(input: &Value) -> Result<(), ToolResult> {
    match input.get("encoding").and_then(|v| v.as_str()) {
        None => Ok(()),
        Some(e) if e.eq_ignore_ascii_case("utf-8") || e.eq_ignore_ascii_case("utf8") => Ok(()),
        Some(e) => Err(ToolResult::error(format!("Unsupported encoding: {}", e))),
    }
}
