//! Handlers for the `/connections` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use synth_core::error::CoreError;
use synth_core::types::DbId;
use synth_db::repositories::ConnectionRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<String>,
}

/// GET /api/v1/connections/{id}/tables/{table}/columns
///
/// Columns of a destination table as the inserter will see them.
pub async fn get_table_columns(
    State(state): State<AppState>,
    Path((connection_id, table)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let connection = ConnectionRepo::find_by_id(&state.pool, connection_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DatabaseConnection",
            id: connection_id,
        }))?;

    let columns = state
        .destinations
        .describe_table(&connection.details, &table)
        .await?;

    Ok(Json(DataResponse {
        data: TableColumns { table, columns },
    }))
}
