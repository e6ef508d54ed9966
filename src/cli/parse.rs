//! CLI parse: clap types for scrivener. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scrivener CLI - idempotent batch generation from YAML descriptors
#[derive(Parser)]
#[command(name = "scrivener")]
#[command(about = "Generate documents, scripts and diagrams from YAML descriptor collections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides layered config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every pending descriptor
    Generate {
        /// Restrict the run to these kinds (markdown, script, diagram)
        #[arg(long = "kind")]
        kinds: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Author script descriptors for files not yet in the script collection
    Author {
        /// Directory of scripts to scan (overrides authoring.scripts_dir)
        #[arg(long)]
        scripts_dir: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show key pool availability
    Keys {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the default workspace configuration
    Init {
        /// Overwrite an existing config/config.toml
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    /// Stable command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Author { .. } => "author",
            Commands::Keys { .. } => "keys",
            Commands::Init { .. } => "init",
        }
    }
}
