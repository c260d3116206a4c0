//! Conversational coding assistant
//!
//! A turn-taking agent: the user asks, the model answers or requests tools,
//! tools run inside a confined working directory, and every message is
//! persisted to a per-thread conversation log before the loop continues.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`tools`] - capability registry, path confinement, builtin tools
//! - [`agent`] - the turn loop tying model, tools, and store together
//! - [`server`] - HTTP API over the agent
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentConfig, AgentEngine};
pub use config::{Config, LlmConfig, ResolvedLlmConfig};
pub use llm::{create_client, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use server::AppState;
pub use tools::{CommandPolicy, Tool, ToolContext, ToolError, ToolExecutor, ToolResult, UserPrompter};
