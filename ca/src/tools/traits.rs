//! Tool trait and result envelope

use async_trait::async_trait;
use serde_json::Value;

use super::ToolContext;

/// A named capability the model may request
///
/// Implementations must never panic or return an error past this boundary:
/// every underlying failure is converted into an error `ToolResult` so the
/// agent loop can feed it back to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name advertised to the model
    fn name(&self) -> &'static str;

    /// Natural-language description the model uses to decide when to call
    fn description(&self) -> &'static str;

    /// JSON schema for the tool's parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool against its declared arguments
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Uniform result envelope returned by every tool
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Failed result - recovered locally, never propagated as an Err
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }

    /// Successful result whose payload is a JSON value rather than text
    pub fn success_json(data: &Value) -> Self {
        Self {
            content: data.to_string(),
            is_error: false,
        }
    }

    /// Render as the `{"status": ...}` envelope fed back to the model
    pub fn envelope_json(&self) -> Value {
        if self.is_error {
            serde_json::json!({"status": "error", "message": self.content})
        } else {
            // Preserve structured payloads (directory listings, stats)
            match serde_json::from_str::<Value>(&self.content) {
                Ok(v) if v.is_object() || v.is_array() || v.is_boolean() || v.is_number() => {
                    serde_json::json!({"status": "success", "data": v})
                }
                _ => serde_json::json!({"status": "success", "data": self.content}),
            }
        }
    }
}
