//! ask_user: relay a question from the model to the human operator.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::require_str;

/// Forwards a question to the configured prompter and waits for the reply,
/// bounded by the context's ask_user deadline.
pub struct AskUserTool;

#[async_trait]
impl Tool for AskUserTool {
    fn name(&self) -> &'static str {
        "ask_user"
    }

    fn description(&self) -> &'static str {
        "Ask the user a clarifying question and wait for their answer. Use this when the request is ambiguous."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to put to the user"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let question = match require_str(&input, "question") {
            Ok(q) => q.to_string(),
            Err(e) => return e,
        };
        debug!(question = %question, "AskUserTool::execute: prompting user");

        let prompter = match &ctx.prompter {
            Some(p) => p.clone(),
            None => {
                return ToolResult::error(
                    "No interactive prompter is available in this session".to_string(),
                )
            }
        };

        match tokio::time::timeout(ctx.ask_user_timeout, prompter.ask(&question)).await {
            Ok(Ok(answer)) => ToolResult::success(answer),
            Ok(Err(e)) => ToolResult::error(format!("Failed to read user input: {}", e)),
            Err(_) => ToolResult::error(format!(
                "Timed out after {}s waiting for user input",
                ctx.ask_user_timeout.as_secs()
            )),
        }
    }
}
