//! Directory tools: read_directory, create_directory, delete_directory

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::resolve_path_arg;

/// List directory contents
pub struct ReadDirectoryTool;

#[async_trait]
impl Tool for ReadDirectoryTool {
    fn name(&self) -> &'static str {
        "read_directory"
    }

    fn description(&self) -> &'static str {
        "List a directory. Non-recursive returns immediate entry names; recursive returns all \
         descendant paths relative to the directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the working directory"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "List all descendants instead of immediate entries (default: false)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ReadDirectoryTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let recursive = input["recursive"].as_bool().unwrap_or(false);

        let entries = if recursive {
            let mut entries = Vec::new();
            for entry in WalkDir::new(&path).min_depth(1) {
                match entry {
                    Ok(e) => {
                        let rel = e.path().strip_prefix(&path).unwrap_or(e.path());
                        entries.push(rel.to_string_lossy().to_string());
                    }
                    Err(e) => return ToolResult::error(format!("Failed to list {}: {}", path.display(), e)),
                }
            }
            entries
        } else {
            let mut read_dir = match tokio::fs::read_dir(&path).await {
                Ok(rd) => rd,
                Err(e) => return ToolResult::error(format!("Failed to list {}: {}", path.display(), e)),
            };
            let mut entries = Vec::new();
            loop {
                match read_dir.next_entry().await {
                    Ok(Some(entry)) => entries.push(entry.file_name().to_string_lossy().to_string()),
                    Ok(None) => break,
                    Err(e) => return ToolResult::error(format!("Failed to list {}: {}", path.display(), e)),
                }
            }
            entries
        };

        let mut entries = entries;
        entries.sort();
        ToolResult::success_json(&serde_json::json!(entries))
    }
}

/// Create a directory
pub struct CreateDirectoryTool;

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &'static str {
        "create_directory"
    }

    fn description(&self) -> &'static str {
        "Create a directory. Idempotent if it already exists; recursive creates missing parents."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the working directory"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Create missing parent directories (default: true)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CreateDirectoryTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let recursive = input["recursive"].as_bool().unwrap_or(true);

        // Existing directory is success, matching mkdir -p semantics
        if path.is_dir() {
            return ToolResult::success(format!("Directory {} created", input["path"].as_str().unwrap_or("")));
        }

        let result = if recursive {
            tokio::fs::create_dir_all(&path).await
        } else {
            tokio::fs::create_dir(&path).await
        };

        match result {
            Ok(()) => ToolResult::success(format!("Directory {} created", input["path"].as_str().unwrap_or(""))),
            Err(e) => ToolResult::error(format!("Failed to create {}: {}", path.display(), e)),
        }
    }
}

/// Delete a directory
pub struct DeleteDirectoryTool;

#[async_trait]
impl Tool for DeleteDirectoryTool {
    fn name(&self) -> &'static str {
        "delete_directory"
    }

    fn description(&self) -> &'static str {
        "Delete a directory. Without recursive it must be empty; with recursive the whole subtree \
         is removed irreversibly."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the working directory"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Remove the directory and everything under it (default: false)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DeleteDirectoryTool::execute: called");
        let path = match resolve_path_arg(&input, "path", ctx) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let recursive = input["recursive"].as_bool().unwrap_or(false);

        let result = if recursive {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_dir(&path).await
        };

        match result {
            Ok(()) => ToolResult::success(format!("Directory {} deleted", input["path"].as_str().unwrap_or(""))),
            Err(e) => ToolResult::error(format!("Failed to delete {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_directory_non_recursive() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/b.txt"), "").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadDirectoryTool.execute(serde_json::json!({"path": "."}), &ctx).await;

        assert!(!result.is_error);
        let entries: Vec<String> = serde_json::from_str(&result.content).unwrap();
        assert_eq!(entries, vec!["a.txt".to_string(), "sub".to_string()]);
    }

    #[tokio::test]
    async fn test_read_directory_recursive_returns_relative_paths() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/b.txt"), "").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ReadDirectoryTool
            .execute(serde_json::json!({"path": ".", "recursive": true}), &ctx)
            .await;

        assert!(!result.is_error);
        let entries: Vec<String> = serde_json::from_str(&result.content).unwrap();
        assert!(entries.contains(&"sub".to_string()));
        assert!(entries.contains(&format!("sub{}b.txt", std::path::MAIN_SEPARATOR)));
    }

    #[tokio::test]
    async fn test_create_directory_idempotent() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let first = CreateDirectoryTool
            .execute(serde_json::json!({"path": "nested/dir"}), &ctx)
            .await;
        let second = CreateDirectoryTool
            .execute(serde_json::json!({"path": "nested/dir"}), &ctx)
            .await;

        assert!(!first.is_error);
        assert!(!second.is_error);
        assert!(temp.path().join("nested/dir").is_dir());
    }

    #[tokio::test]
    async fn test_create_directory_non_recursive_requires_parent() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = CreateDirectoryTool
            .execute(serde_json::json!({"path": "missing/child", "recursive": false}), &ctx)
            .await;

        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_delete_directory_non_recursive_fails_on_non_empty() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("full")).unwrap();
        std::fs::write(temp.path().join("full/a.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = DeleteDirectoryTool
            .execute(serde_json::json!({"path": "full"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(temp.path().join("full/a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_directory_recursive_removes_subtree() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("full/deep")).unwrap();
        std::fs::write(temp.path().join("full/deep/a.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = DeleteDirectoryTool
            .execute(serde_json::json!({"path": "full", "recursive": true}), &ctx)
            .await;

        assert!(!result.is_error);
        assert!(!temp.path().join("full").exists());
    }
}
