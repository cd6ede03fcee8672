//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Random-user ingestion pipeline
#[derive(Parser, Debug)]
#[command(name = "userflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one user and publish it (one producer tick)
    Produce,

    /// Run the producer on its schedule until interrupted
    Schedule,

    /// Consume the user topic into storage until interrupted
    Consume {
        /// Checkpoint directory (overrides stream.checkpoint_dir)
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,
    },

    /// Create the keyspace and table if absent
    InitSchema,

    /// Normalize a raw user (or a whole API response) without publishing
    Normalize {
        /// Input JSON file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print stored rows
    Rows {
        /// Maximum rows to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Validate the configuration and print the effective values
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
