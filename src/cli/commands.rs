//! CLI command implementations

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use super::args::{Cli, Command, QueryArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};
use crate::http_server::{HttpServer, SharedStore};
use crate::observability::{init_tracing, log_event, Event};
use crate::query::{QueryDescriptor, QueryResult, QueryShaper, Shaped};
use crate::store::{RecordStore, StudentStore};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::Query { config, options } => query(config.as_deref(), &options),
    }
}

/// Start the HTTP server and block until it shuts down
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::resolve(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
        config.validate()?;
    }

    init_tracing(config.log_format);
    log_event(Event::BootStart);

    let store: SharedStore = Arc::new(StudentStore::seeded());
    tracing::info!(
        event = %Event::ConfigLoaded,
        addr = %config.http.socket_addr(),
        log_format = %config.log_format,
        records = store.get_all().len(),
        "configuration loaded"
    );

    let server = HttpServer::new(config.http, store, config.query);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Shape the seeded collection once and print the result to stdout
pub fn query(config_path: Option<&Path>, options: &QueryArgs) -> CliResult<()> {
    let config = Config::resolve(config_path)?;
    init_tracing(config.log_format);

    let store = StudentStore::seeded();
    let mut stdout = io::stdout().lock();
    execute_query(&config, &store, options, &mut stdout)
}

/// Shape `store` with `options` and write the response envelope to `out`.
///
/// A rejected query is written as an error envelope and also returned as
/// an error, so the process exits non-zero.
pub fn execute_query<S, W>(
    config: &Config,
    store: &S,
    options: &QueryArgs,
    out: &mut W,
) -> CliResult<()>
where
    S: RecordStore,
    W: Write,
{
    match shape(config, store, options) {
        Ok(shaped) => write_response(out, &shaped),
        Err(e) => {
            write_error(out, e.code(), &e.to_string())?;
            Err(CliError::query_rejected(e.to_string()))
        }
    }
}

fn shape<S: RecordStore>(config: &Config, store: &S, options: &QueryArgs) -> QueryResult<Shaped> {
    let query = QueryDescriptor::parse(options.to_params())?;
    QueryShaper::new(config.query.clone()).apply(store.get_all(), &query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn run_query(options: QueryArgs) -> (CliResult<()>, Value) {
        let mut out = Vec::new();
        let result = execute_query(
            &Config::default(),
            &StudentStore::seeded(),
            &options,
            &mut out,
        );
        let value = serde_json::from_slice(&out).unwrap();
        (result, value)
    }

    #[test]
    fn test_query_writes_ok_envelope() {
        let (result, value) = run_query(QueryArgs {
            select: Some("id".into()),
            top: Some("2".into()),
            ..Default::default()
        });

        assert!(result.is_ok());
        assert_eq!(
            value,
            serde_json::json!({"status": "ok", "data": [{"id": 1}, {"id": 2}]})
        );
    }

    #[test]
    fn test_query_with_count() {
        let (_, value) = run_query(QueryArgs {
            filter: Some("active eq false".into()),
            count: true,
            ..Default::default()
        });

        assert_eq!(value["data"]["@odata.count"], 2);
    }

    #[test]
    fn test_rejected_query_writes_error_envelope() {
        let (result, value) = run_query(QueryArgs {
            orderby: Some("bogusField".into()),
            ..Default::default()
        });

        let err = result.unwrap_err();
        assert_eq!(err.code_str(), "ROSTER_CLI_QUERY_REJECTED");
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "InvalidQuery");
        assert!(value["message"].as_str().unwrap().contains("bogusField"));
    }
}
