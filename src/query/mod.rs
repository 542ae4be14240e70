//! # Query Shaping
//!
//! Turns request query options (`$select`, `$filter`, `$orderby`, `$skip`,
//! `$top`, `$count`) into a shaped view of an entity collection.
//!
//! Flow:
//! 1. [`QueryDescriptor::parse`] reads the raw key/value pairs
//! 2. [`QueryShaper::apply`] binds the descriptor to the entity schema and
//!    the service [`QuerySettings`], then evaluates it
//! 3. The resulting [`Shaped`] value serializes straight into the response
//!
//! Any failure is a [`QueryError::InvalidQuery`] naming the offending option.

mod errors;
mod filter;
mod lexer;
mod options;
mod parser;
mod response;
mod shaper;

pub use errors::{QueryError, QueryResult};
pub use filter::{ComparisonOp, FilterExpr, Operand, Scalar, StringFunction};
pub use options::{QueryOption, QuerySettings, DEFAULT_MAX_NODE_COUNT, MAX_FILTER_DEPTH};
pub use parser::{parse_filter, OrderBy, QueryDescriptor, Selection, SortDirection};
pub use response::{Shaped, COUNT_KEY, VALUE_KEY};
pub use shaper::QueryShaper;
