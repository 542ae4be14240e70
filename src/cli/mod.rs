//! CLI module for roster
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - query: One-shot query against the built-in student records

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{execute_query, query, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
