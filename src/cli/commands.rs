//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Incremental pagination over HTTP sources
#[derive(Parser, Debug)]
#[command(name = "pagefeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through a source, printing records as they arrive
    Fetch {
        /// Source definition file (YAML or JSON)
        #[arg(short, long)]
        source: PathBuf,

        /// Stop after this many pages (at least one)
        #[arg(long)]
        max_pages: Option<NonZeroUsize>,

        /// Re-request a page this many times on transient errors
        #[arg(long, default_value = "0")]
        retries: u32,
    },

    /// Validate a source definition
    Validate {
        /// Source definition file (YAML or JSON)
        #[arg(short, long)]
        source: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
