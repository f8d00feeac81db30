//! Handlers for the `/runs` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use synth_core::error::CoreError;
use synth_core::types::DbId;
use synth_db::models::job_run::JobRun;
use synth_db::repositories::JobRunRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// A job run with its status name resolved.
#[derive(Debug, Serialize)]
pub struct RunView {
    #[serde(flatten)]
    pub run: JobRun,
    pub status: &'static str,
}

impl From<JobRun> for RunView {
    fn from(run: JobRun) -> Self {
        let status = run.status().map_or("Unknown", |s| s.name());
        Self { run, status }
    }
}

/// GET /api/v1/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let run = JobRunRepo::find_by_id(&state.pool, run_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "JobRun",
            id: run_id,
        }))?;

    Ok(Json(DataResponse {
        data: RunView::from(run),
    }))
}
