//! Tool system for the coding-assistant agent
//!
//! Tools are the closed set of capabilities the model may request: file
//! system access, process execution, OS inspection, and asking the human a
//! question. Every tool runs against a `ToolContext` whose confinement root
//! it cannot escape, and returns a uniform result envelope - tool failures
//! are data fed back to the model, never exceptions.

mod context;
mod error;
mod executor;
mod policy;
mod traits;

pub mod builtin;

pub use context::{ToolContext, UserPrompter, UserPrompterRef};
pub use error::ToolError;
pub use executor::ToolExecutor;
pub use policy::CommandPolicy;
pub use traits::{Tool, ToolResult};
