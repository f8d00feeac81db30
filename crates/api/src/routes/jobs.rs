use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST /{id}/generate    -> generate_job_data
/// GET  /{id}/stream      -> stream_job
/// GET  /{id}/runs        -> list_job_runs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/generate", post(jobs::generate_job_data))
        .route("/{id}/stream", get(jobs::stream_job))
        .route("/{id}/runs", get(jobs::list_job_runs))
}
