//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conversational coding assistant
#[derive(Parser)]
#[command(
    name = "ca",
    about = "Conversational coding assistant with a tool-calling LLM loop",
    version,
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single turn from the terminal
    Chat {
        /// Thread to continue (created on first use)
        #[arg(short, long, default_value = "default")]
        thread: String,

        /// The request to send
        query: String,

        /// Working directory for tools (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// List known threads
    Threads,

    /// Print the transcript of a thread
    History {
        /// Thread id
        thread: String,
    },
}
