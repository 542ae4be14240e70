//! roster - read-only student records behind an OData-style query endpoint
//!
//! `GET /api/students` accepts `$select`, `$filter`, `$orderby`, `$skip`,
//! `$top` and `$count`; the [`query::QueryShaper`] applies them to the
//! in-memory [`store::StudentStore`].

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod query;
pub mod schema;
pub mod store;
