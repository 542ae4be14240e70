//! CLI argument definitions using clap
//!
//! Commands:
//! - roster serve [--config <path>] [--port <n>]
//! - roster query [--config <path>] [--select ..] [--filter ..] [--orderby ..]
//!   [--skip n] [--top n] [--count]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::query::QueryOption;

/// roster - read-only student records with query shaping
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Shape the student collection once and print the result
    Query {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        options: QueryArgs,
    },
}

/// Query options for the `query` command.
///
/// Values are passed through unparsed so they are validated exactly like
/// HTTP query strings.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    /// Comma-separated fields, or `*`
    #[arg(long)]
    pub select: Option<String>,

    /// Filter expression, e.g. "gpa ge 3.5 and active"
    #[arg(long, allow_hyphen_values = true)]
    pub filter: Option<String>,

    /// Comma-separated `field [asc|desc]` clauses
    #[arg(long)]
    pub orderby: Option<String>,

    /// Records to skip
    #[arg(long, allow_hyphen_values = true)]
    pub skip: Option<String>,

    /// Maximum records to return
    #[arg(long, allow_hyphen_values = true)]
    pub top: Option<String>,

    /// Wrap the result with the filtered count
    #[arg(long)]
    pub count: bool,
}

impl QueryArgs {
    /// Key/value pairs in query-string form
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let options = [
            (QueryOption::Select, &self.select),
            (QueryOption::Filter, &self.filter),
            (QueryOption::OrderBy, &self.orderby),
            (QueryOption::Skip, &self.skip),
            (QueryOption::Top, &self.top),
        ];
        for (option, value) in options {
            if let Some(value) = value {
                params.push((option.as_str(), value.clone()));
            }
        }
        if self.count {
            params.push((QueryOption::Count.as_str(), "true".to_string()));
        }
        params
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
