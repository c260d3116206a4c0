//! Tool errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the tool layer
///
/// These never cross the executor boundary as `Err`; they are rendered into
/// error result envelopes before reaching the agent loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Path {path} escapes the confinement root {root}")]
    SandboxViolation { path: PathBuf, root: PathBuf },
}
