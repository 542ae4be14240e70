//! # HTTP Server Module
//!
//! Axum server exposing the students collection.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/students` - Students, shaped by `$select`, `$filter`, `$orderby`,
//!   `$skip`, `$top` and `$count`

pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
pub mod students_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
pub use students_routes::SharedStore;
