pub mod connections;
pub mod health;
pub mod jobs;
pub mod runs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs/{id}/generate                              execute one batch run (POST)
/// /jobs/{id}/stream                                live record stream (SSE)
/// /jobs/{id}/runs                                  run history (GET, ?limit&offset)
///
/// /runs/{id}                                       single run (GET)
///
/// /connections/{id}/tables/{table}/columns         destination table columns (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/runs", runs::router())
        .nest("/connections", connections::router())
}
