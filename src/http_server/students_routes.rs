//! Students HTTP Routes
//!
//! The read-only students collection. Every supported query option is
//! applied by the [`QueryShaper`] before the response is written.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::errors::{ApiError, ApiResult};
use crate::observability::Event;
use crate::query::{QueryDescriptor, QueryError, QuerySettings, QueryShaper, Shaped};
use crate::store::{RecordStore, Student};

/// Store handle shared by every request
pub type SharedStore = Arc<dyn RecordStore<Entity = Student>>;

/// Shared students state
pub struct StudentsState {
    store: SharedStore,
    shaper: QueryShaper,
}

impl StudentsState {
    pub fn new(store: SharedStore, settings: QuerySettings) -> Self {
        Self {
            store,
            shaper: QueryShaper::new(settings),
        }
    }
}

/// Students routes with shared state
pub fn students_routes(state: Arc<StudentsState>) -> Router {
    Router::new()
        .route("/students", get(list_students_handler))
        .with_state(state)
}

/// `GET /students`
///
/// Query pairs are extracted as a list so repeated options can be rejected.
async fn list_students_handler(
    State(state): State<Arc<StudentsState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Shaped>> {
    let query = QueryDescriptor::parse(params).map_err(rejected)?;
    let shaped = state
        .shaper
        .apply(state.store.get_all(), &query)
        .map_err(rejected)?;

    tracing::debug!(
        event = %Event::QueryExecuted,
        returned = shaped.len(),
        count = ?shaped.count,
        "query shaped"
    );
    Ok(Json(shaped))
}

fn rejected(err: QueryError) -> ApiError {
    tracing::warn!(
        event = %Event::QueryRejected,
        parameter = err.option(),
        message = err.message(),
        "query rejected"
    );
    ApiError::from(err)
}
