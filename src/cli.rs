//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// codescout - LLM-driven codebase exploration
#[derive(Parser)]
#[command(
    name = "codescout",
    about = "LLM-driven codebase exploration agent",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/codescout/logs/codescout.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Explore a codebase to answer a query
    Explore {
        /// The question to answer about the codebase
        query: String,

        /// Directory to explore
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Global iteration budget across all steps
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate an exploration plan without running it
    Plan {
        /// The question the plan should answer
        query: String,

        /// Directory to explore
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Fingerprint a codebase without exploring it
    Scan {
        /// Directory to scan
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for results
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
