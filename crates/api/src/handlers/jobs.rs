//! Handlers for the `/jobs` resource: batch execution, live streaming and
//! run history.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::{Stream, StreamExt};
use synth_core::error::CoreError;
use synth_core::types::DbId;
use synth_db::models::job_run::JobRunListQuery;
use synth_db::repositories::{JobRepo, JobRunRepo};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{AppError, AppResult};
use crate::handlers::runs::RunView;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/jobs/{id}/generate
///
/// Execute one batch run and return its summary. The run is driven on its
/// own task so a client that disconnects mid-run still leaves a finished
/// or failed run behind, never one stuck in `Started`.
pub async fn generate_job_data(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let executor = state.executor.clone();
    let result = tokio::spawn(async move { executor.execute_job(job_id).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Run task for job {job_id} aborted: {e}")))??;

    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/jobs/{id}/stream
///
/// Server-sent events, one `data:` frame per generated record. The stream
/// ends when generation fails, the job cannot be loaded, or the server shuts
/// down. A client disconnect drops the receiver, which stops the session.
pub async fn stream_job(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.streams.start(job_id, state.shutdown.child_token());
    let (records, _handle) = session.into_parts();

    tracing::info!(job_id, "Stream opened");

    let events = ReceiverStream::new(records).filter_map(|record| async move {
        match Event::default().json_data(&record) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unserializable record");
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /api/v1/jobs/{id}/runs
///
/// Newest first. Supports `?limit=` (default 50, max 100) and `?offset=`.
pub async fn list_job_runs(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Query(params): Query<JobRunListQuery>,
) -> AppResult<impl IntoResponse> {
    JobRepo::find_by_id(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    let runs: Vec<RunView> = JobRunRepo::list_by_job(&state.pool, job_id, &params)
        .await?
        .into_iter()
        .map(RunView::from)
        .collect();

    Ok(Json(DataResponse { data: runs }))
}
