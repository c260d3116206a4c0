//! Conversational coding assistant
//!
//! CLI entry point: serve the HTTP API or run turns from the terminal.

use std::fs;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use codeassist::agent::{AgentConfig, AgentEngine};
use codeassist::cli::{Cli, Command};
use codeassist::config::Config;
use codeassist::llm::create_client;
use codeassist::server::{serve, AppState};
use codeassist::tools::{CommandPolicy, ToolExecutor, UserPrompter};

use chatstore::{ChatRole, ConversationStore};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    // Logs go to a file so interactive output stays clean
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codeassist")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = match cli_log_level.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("codeassist.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Answers `ask_user` by reading a line from the terminal
struct ConsolePrompter;

#[async_trait]
impl UserPrompter for ConsolePrompter {
    async fn ask(&self, question: &str) -> Result<String> {
        let question = question.to_string();
        tokio::task::spawn_blocking(move || {
            print!("{}\n> ", question);
            std::io::stdout().flush()?;
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer)?;
            Ok(answer.trim_end_matches(['\r', '\n']).to_string())
        })
        .await?
    }
}

fn build_engine(config: &Config, root_override: Option<PathBuf>) -> Result<AgentEngine> {
    config.validate()?;

    let llm = create_client(&config.llm.resolve())?;
    let store = Arc::new(ConversationStore::open(&config.store.path)?);

    let root = root_override.unwrap_or_else(|| config.agent.root.clone());
    let root = root
        .canonicalize()
        .context(format!("Working directory does not exist: {}", root.display()))?;

    let mut agent_config = AgentConfig::new(root);
    agent_config.max_turns = config.agent.max_turns;
    agent_config.max_tokens = config.llm.max_tokens;
    agent_config.command_timeout = Duration::from_millis(config.agent.command_timeout_ms);
    agent_config.ask_user_timeout = Duration::from_millis(config.agent.ask_user_timeout_ms);
    agent_config.command_policy = Arc::new(CommandPolicy::new(
        config.agent.denied_commands.clone(),
        config.agent.allowed_commands.clone(),
    ));

    Ok(AgentEngine::new(llm, ToolExecutor::standard(), store, agent_config))
}

async fn cmd_serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let engine = build_engine(config, None)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context(format!("Invalid bind address {}:{}", host, port))?;

    println!("Listening on http://{}", addr);
    serve(AppState::new(Arc::new(engine)), addr).await
}

async fn cmd_chat(config: &Config, thread: &str, query: &str, root: Option<PathBuf>) -> Result<()> {
    let engine = build_engine(config, root)?.with_prompter(Arc::new(ConsolePrompter));

    let result = engine.run_turn(thread, query).await?;
    println!("{}", result);
    Ok(())
}

fn cmd_threads(config: &Config) -> Result<()> {
    let store = ConversationStore::open(&config.store.path)?;
    for id in store.thread_ids()? {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_history(config: &Config, thread: &str) -> Result<()> {
    let store = ConversationStore::open(&config.store.path)?;
    for msg in store.history(thread)? {
        match msg.role {
            ChatRole::User => println!("user: {}", msg.content),
            ChatRole::Assistant if !msg.content.is_empty() => println!("ai: {}", msg.content),
            _ => {}
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?std::env::args().collect::<Vec<_>>(), "main: dispatching command");
    match cli.command {
        Command::Serve { host, port } => cmd_serve(&config, host, port).await,
        Command::Chat { thread, query, root } => cmd_chat(&config, &thread, &query, root).await,
        Command::Threads => cmd_threads(&config),
        Command::History { thread } => cmd_history(&config, &thread),
    }
}
