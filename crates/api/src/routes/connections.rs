use axum::routing::get;
use axum::Router;

use crate::handlers::connections;
use crate::state::AppState;

/// Routes mounted at `/connections`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}/tables/{table}/columns",
        get(connections::get_table_columns),
    )
}
