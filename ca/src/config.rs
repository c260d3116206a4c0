//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Agent loop configuration
    pub agent: AgentSection,

    /// Conversation storage configuration
    pub store: StoreSection,

    /// HTTP server configuration
    pub server: ServerSection,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .codeassist.yml
        let local_config = PathBuf::from(".codeassist.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/codeassist/codeassist.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("codeassist").join("codeassist.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Resolve into the shape the client constructors consume
    pub fn resolve(&self) -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key_env: self.api_key_env.clone(),
            base_url: self.base_url.clone(),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Fully resolved LLM configuration, ready to build a client from
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .context(format!("API key environment variable {} is not set", self.api_key_env))
    }
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Working directory tools are confined to
    pub root: PathBuf,

    /// Maximum model round-trips per user turn
    #[serde(rename = "max-turns")]
    pub max_turns: u32,

    /// `run_command` timeout in milliseconds
    #[serde(rename = "command-timeout-ms")]
    pub command_timeout_ms: u64,

    /// `ask_user` deadline in milliseconds
    #[serde(rename = "ask-user-timeout-ms")]
    pub ask_user_timeout_ms: u64,

    /// Extra command prefixes to deny, on top of the built-in list
    #[serde(rename = "denied-commands")]
    pub denied_commands: Vec<String>,

    /// If non-empty, only commands with these prefixes may run
    #[serde(rename = "allowed-commands")]
    pub allowed_commands: Vec<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_turns: 16,
            command_timeout_ms: 120_000,
            ask_user_timeout_ms: 300_000,
            denied_commands: Vec::new(),
            allowed_commands: Vec::new(),
        }
    }
}

/// Conversation storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Directory holding one JSONL file per thread
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("codeassist").join("threads"))
            .unwrap_or_else(|| PathBuf::from(".codeassist-threads"));
        Self { path }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.agent.max_turns, 16);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o-mini
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 8192
  timeout-ms: 60000

agent:
  root: /tmp/project
  max-turns: 8
  denied-commands:
    - "curl"

server:
  host: 0.0.0.0
  port: 9000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.agent.max_turns, 8);
        assert_eq!(config.agent.root, PathBuf::from("/tmp/project"));
        assert_eq!(config.agent.denied_commands, vec!["curl".to_string()]);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gpt-4o-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.agent.max_turns, 16);
    }

    #[test]
    fn test_resolve_llm_config() {
        let config = LlmConfig::default();
        let resolved = config.resolve();

        assert_eq!(resolved.provider, "openai");
        assert_eq!(resolved.max_tokens, 4096);
    }
}
