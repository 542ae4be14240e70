//! Configuration file
//!
//! A single JSON object; every section and field is optional. The values
//! below are the defaults.
//!
//! ```json
//! {
//!   "http": { "host": "0.0.0.0", "port": 5000, "cors_origins": [] },
//!   "query": { "select": true, "filter": true, "order_by": true,
//!              "paging": true, "count": true, "max_top": null,
//!              "max_node_count": 100,
//!              "functions": ["contains", "startswith", "endswith"] },
//!   "log_format": "json"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;
use crate::query::QuerySettings;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP listener and CORS
    #[serde(default)]
    pub http: HttpServerConfig,

    /// Accepted query options and their limits
    #[serde(default)]
    pub query: QuerySettings,

    /// Log output format (default "json")
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path`, or use defaults when no path is given
    pub fn resolve(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        self.http.validate().map_err(CliError::config_error)?;
        self.query
            .validate()
            .map_err(|e| CliError::config_error(format!("query.{}", e)))?;
        Ok(())
    }
}
