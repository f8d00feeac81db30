use axum::routing::get;
use axum::Router;

use crate::handlers::runs;
use crate::state::AppState;

/// Routes mounted at `/runs`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(runs::get_run))
}
