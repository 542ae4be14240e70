//! # Query Errors
//!
//! Every failure the query shaper can report is an [`QueryError::InvalidQuery`]:
//! unknown fields, type mismatches, malformed syntax, bad paging values and
//! options that are switched off. Errors name the offending query option so
//! the caller can build a client-facing message.

use std::fmt;

use thiserror::Error;

/// Result type for query parsing and shaping
pub type QueryResult<T> = Result<T, QueryError>;

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The request's query options cannot be applied
    #[error("Invalid query option {option}: {message}")]
    InvalidQuery { option: String, message: String },
}

impl QueryError {
    /// Create an `InvalidQuery` error for `option`
    pub fn invalid(option: impl fmt::Display, message: impl Into<String>) -> Self {
        QueryError::InvalidQuery {
            option: option.to_string(),
            message: message.into(),
        }
    }

    /// Stable error code for client payloads
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidQuery { .. } => "InvalidQuery",
        }
    }

    /// The query option that was rejected (e.g. `$orderby`)
    pub fn option(&self) -> &str {
        match self {
            QueryError::InvalidQuery { option, .. } => option,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            QueryError::InvalidQuery { message, .. } => message,
        }
    }
}
