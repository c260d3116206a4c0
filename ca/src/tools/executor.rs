//! ToolExecutor - the closed capability registry

use std::collections::HashMap;
use tracing::debug;

use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{
    AppendFileTool, AskUserTool, CheckFileExistsTool, CopyFileTool, CreateAndWriteFileTool, CreateDirectoryTool,
    CreateFileTool, DeleteDirectoryTool, DeleteFileTool, GetFileStatsTool, ReadDirectoryTool, ReadFileTool,
    ReadJsonFileTool, RenameFileTool, RunCommandTool, SystemInfoTool, WriteFileTool, WriteJsonFileTool,
};
use super::{Tool, ToolContext, ToolResult};

/// Dispatches tool calls to the fixed set of capabilities
///
/// The registry is built once at startup; the model may only request names
/// from `definitions()`. A request for an unknown name is a contract
/// violation on the model's side, reported back as an error envelope so the
/// model can self-correct rather than crashing the turn.
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create the executor with the standard capability catalog
    pub fn standard() -> Self {
        debug!("ToolExecutor::standard: called");
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::new();

        // File reading
        Self::insert(&mut tools, Box::new(ReadFileTool));
        Self::insert(&mut tools, Box::new(ReadJsonFileTool));
        Self::insert(&mut tools, Box::new(ReadDirectoryTool));
        Self::insert(&mut tools, Box::new(CheckFileExistsTool));
        Self::insert(&mut tools, Box::new(GetFileStatsTool));

        // File writing
        Self::insert(&mut tools, Box::new(WriteFileTool));
        Self::insert(&mut tools, Box::new(CreateAndWriteFileTool));
        Self::insert(&mut tools, Box::new(AppendFileTool));
        Self::insert(&mut tools, Box::new(CreateFileTool));
        Self::insert(&mut tools, Box::new(WriteJsonFileTool));
        Self::insert(&mut tools, Box::new(CreateDirectoryTool));

        // File management
        Self::insert(&mut tools, Box::new(DeleteFileTool));
        Self::insert(&mut tools, Box::new(DeleteDirectoryTool));
        Self::insert(&mut tools, Box::new(RenameFileTool));
        Self::insert(&mut tools, Box::new(CopyFileTool));

        // Process / OS / human
        Self::insert(&mut tools, Box::new(RunCommandTool));
        Self::insert(&mut tools, Box::new(SystemInfoTool));
        Self::insert(&mut tools, Box::new(AskUserTool));

        Self { tools }
    }

    /// Create an empty executor (for testing)
    pub fn empty() -> Self {
        Self { tools: HashMap::new() }
    }

    fn insert(tools: &mut HashMap<String, Box<dyn Tool>>, tool: Box<dyn Tool>) {
        tools.insert(tool.name().to_string(), tool);
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolExecutor::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for advertising to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        // Stable order keeps prompts reproducible across runs
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a single tool call
    pub async fn execute(&self, tool_call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        debug!(tool_name = %tool_call.name, tool_id = %tool_call.id, "ToolExecutor::execute: called");
        match self.tools.get(&tool_call.name) {
            Some(tool) => tool.execute(tool_call.input.clone(), ctx).await,
            None => {
                debug!(tool_name = %tool_call.name, "ToolExecutor::execute: unknown tool");
                ToolResult::error(format!("Unknown tool: {}", tool_call.name))
            }
        }
    }

    /// Execute multiple tool calls sequentially, preserving request order
    pub async fn execute_all(&self, tool_calls: &[ToolCall], ctx: &ToolContext) -> Vec<(String, ToolResult)> {
        debug!(count = %tool_calls.len(), "ToolExecutor::execute_all: called");
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            let result = self.execute(call, ctx).await;
            results.push((call.id.clone(), result));
        }

        results
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::standard()
    }
}
