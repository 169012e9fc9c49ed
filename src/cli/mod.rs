//! CLI module
//!
//! Command-line interface for paginating HTTP sources.
//!
//! # Commands
//!
//! - `fetch` - Page through a source and print its records
//! - `validate` - Check a source definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{FetchSummary, Runner};
