//! ToolContext - execution context for tools

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::policy::CommandPolicy;
use super::ToolError;

/// Answers `ask_user` questions - injected so the suspend point has an
/// explicit owner and deadline instead of a blocking console read
#[async_trait::async_trait]
pub trait UserPrompter: Send + Sync {
    /// Put the question to the human and return their answer
    async fn ask(&self, question: &str) -> eyre::Result<String>;
}

/// Type alias for a shared prompter
pub type UserPrompterRef = Arc<dyn UserPrompter>;

/// Default timeout for `run_command`
const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 120_000;

/// Default deadline for `ask_user`
const DEFAULT_ASK_USER_TIMEOUT_MS: u64 = 300_000;

/// Execution context for tools - scoped to a single turn
///
/// Every path-based capability resolves its arguments through this context.
/// The confinement root is a security boundary: tools cannot address
/// locations outside it unless the sandbox is explicitly disabled (tests).
#[derive(Clone)]
pub struct ToolContext {
    /// Confinement root - all file ops constrained here
    pub root: PathBuf,

    /// Thread id of the conversation driving this turn
    pub thread_id: String,

    /// Whether confinement is enforced (default: true)
    pub sandbox_enabled: bool,

    /// Allow/deny policy applied to `run_command`
    pub command_policy: Arc<CommandPolicy>,

    /// Timeout applied to `run_command`
    pub command_timeout: Duration,

    /// Deadline for `ask_user` responses
    pub ask_user_timeout: Duration,

    /// Optional prompter for `ask_user`; absent in non-interactive contexts
    pub prompter: Option<UserPrompterRef>,
}

impl ToolContext {
    /// Create a new tool context rooted at the given directory
    pub fn new(root: PathBuf, thread_id: String) -> Self {
        debug!(?root, %thread_id, "ToolContext::new: called");
        Self {
            root,
            thread_id,
            sandbox_enabled: true,
            command_policy: Arc::new(CommandPolicy::default()),
            command_timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
            ask_user_timeout: Duration::from_millis(DEFAULT_ASK_USER_TIMEOUT_MS),
            prompter: None,
        }
    }

    /// Create a context with confinement disabled (for testing)
    pub fn new_unsandboxed(root: PathBuf, thread_id: String) -> Self {
        debug!(?root, %thread_id, "ToolContext::new_unsandboxed: called");
        Self {
            sandbox_enabled: false,
            ..Self::new(root, thread_id)
        }
    }

    /// Builder method to set the command policy
    pub fn with_command_policy(mut self, policy: Arc<CommandPolicy>) -> Self {
        self.command_policy = policy;
        self
    }

    /// Builder method to set the command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Builder method to set the ask_user deadline
    pub fn with_ask_user_timeout(mut self, timeout: Duration) -> Self {
        self.ask_user_timeout = timeout;
        self
    }

    /// Builder method to set the user prompter
    pub fn with_prompter(mut self, prompter: UserPrompterRef) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Normalize a path relative to the confinement root
    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Resolve a caller-supplied path and enforce confinement
    ///
    /// Prefix-joining alone is not enough: `../` sequences and symlinks can
    /// escape a joined prefix, so the candidate is canonicalized (its nearest
    /// existing ancestor for not-yet-created files) and the result must stay
    /// under the canonicalized root.
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "ToolContext::validate_path: called");
        let normalized = self.normalize_path(path);

        if !self.sandbox_enabled {
            return Ok(normalized);
        }

        let canonical = if normalized.exists() {
            normalized.canonicalize().unwrap_or_else(|_| normalized.clone())
        } else {
            // For non-existent paths, canonicalize the parent and re-join
            match normalized.parent() {
                Some(parent) if parent.exists() => {
                    let canonical_parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
                    canonical_parent.join(normalized.file_name().unwrap_or_default())
                }
                _ => lexical_normalize(&normalized),
            }
        };

        let root_canonical = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

        if canonical.starts_with(&root_canonical) {
            Ok(canonical)
        } else {
            debug!(?path, "ToolContext::validate_path: confinement violation");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem
///
/// Used for paths whose parents do not exist yet, where canonicalize cannot
/// help; `..` must still not walk above the joined root.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("root", &self.root)
            .field("thread_id", &self.thread_id)
            .field("sandbox_enabled", &self.sandbox_enabled)
            .finish()
    }
}
