//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `produce` - One producer tick: fetch, normalize, publish
//! - `schedule` - Producer ticks on the configured cadence
//! - `consume` - Long-running subscription into storage
//! - `init-schema` - Create the keyspace and table
//! - `normalize` - Normalize a raw record offline
//! - `rows` - Inspect stored rows
//! - `validate` - Check the configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
