//! Command execution policy for `run_command`
//!
//! Arbitrary shell execution is the highest-risk capability. Rather than
//! running everything unconditionally, the executor consults a pluggable
//! allow/deny policy first. The default policy blocks command prefixes that
//! can damage the host; an explicit allow list, when present, wins over the
//! deny list.

use tracing::debug;

/// Command prefixes blocked by the default policy
const DEFAULT_DENIED_PREFIXES: &[&str] = &[
    // Destructive filesystem operations outside any sandbox's reach
    "rm -rf /",
    "rm -fr /",
    "mkfs",
    "dd if=",
    "shred",
    // Host state
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    // Privilege escalation
    "sudo",
    "su ",
    // Fork bomb
    ":(){",
];

/// Allow/deny policy applied to every `run_command` invocation
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    /// Prefixes that are always rejected
    denied_prefixes: Vec<String>,
    /// If non-empty, only commands starting with one of these run at all
    allowed_prefixes: Vec<String>,
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self {
            denied_prefixes: DEFAULT_DENIED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            allowed_prefixes: Vec::new(),
        }
    }
}

impl CommandPolicy {
    /// Build a policy from configured prefix lists, keeping the default
    /// deny list underneath the configured one
    pub fn new(denied: Vec<String>, allowed: Vec<String>) -> Self {
        let mut denied_prefixes: Vec<String> = DEFAULT_DENIED_PREFIXES.iter().map(|s| s.to_string()).collect();
        denied_prefixes.extend(denied);
        Self {
            denied_prefixes,
            allowed_prefixes: allowed,
        }
    }

    /// Policy that permits everything (for testing)
    pub fn allow_all() -> Self {
        Self {
            denied_prefixes: Vec::new(),
            allowed_prefixes: Vec::new(),
        }
    }

    /// Check a command string; Err carries the human-readable refusal
    pub fn check(&self, command: &str) -> Result<(), String> {
        let trimmed = command.trim();
        debug!(command = %trimmed, "CommandPolicy::check: called");

        for denied in &self.denied_prefixes {
            if trimmed.starts_with(denied.as_str()) {
                return Err(format!("Command blocked by policy: starts with '{}'", denied));
            }
        }

        if !self.allowed_prefixes.is_empty() {
            let allowed = self.allowed_prefixes.iter().any(|p| trimmed.starts_with(p.as_str()));
            if !allowed {
                return Err("Command not in the configured allow list".to_string());
            }
        }

        Ok(())
    }
}
