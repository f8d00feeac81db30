use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use synth_core::error::CoreError;
use synth_core::types::DbId;
use synth_destination::InsertError;
use synth_pipeline::EngineError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `synth_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A run was created and then failed. The run id is reported so the
    /// caller can look the run up.
    #[error("Job run {run_id} failed: {message}")]
    RunFailed { run_id: DbId, message: String },

    /// A destination database lookup failed.
    #[error(transparent)]
    Destination(#[from] InsertError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => AppError::Core(core),
            EngineError::Database(db) => AppError::Database(db),
            EngineError::RunFailed { run_id, message } => AppError::RunFailed { run_id, message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Engine errors ---
            AppError::RunFailed { run_id, message } => {
                let body = json!({
                    "error": message,
                    "code": "RUN_FAILED",
                    "job_run_id": run_id,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
            }

            // --- Destination errors ---
            AppError::Destination(err) => match err {
                InsertError::TableNotFound(table) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Table {table} not found"),
                ),
                InsertError::UnsupportedDsn(_) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    err.to_string(),
                ),
                InsertError::Connect(e) => {
                    tracing::warn!(error = %e, "Destination unreachable");
                    (
                        StatusCode::BAD_GATEWAY,
                        "DESTINATION_UNAVAILABLE",
                        "Could not connect to the destination database".to_string(),
                    )
                }
                other => {
                    tracing::error!(error = %other, "Destination error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn run_failure_reports_the_run_id() {
        let err: AppError = EngineError::RunFailed {
            run_id: 42,
            message: "Generator failed on chunk 1/2".into(),
        }
        .into();

        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "RUN_FAILED");
        assert_eq!(body["job_run_id"], 42);
        assert_eq!(body["error"], "Generator failed on chunk 1/2");
    }

    #[tokio::test]
    async fn engine_core_errors_keep_their_status() {
        let err: AppError = EngineError::Core(CoreError::Conflict("busy".into())).into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let err: AppError = EngineError::Core(CoreError::NotFound { entity: "Job", id: 9 }).into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Job with id 9 not found");
    }

    #[tokio::test]
    async fn destination_errors_map_to_client_statuses() {
        let err = AppError::from(InsertError::TableNotFound("orders".into()));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Table orders not found");

        let err = AppError::from(InsertError::Connect(sqlx::Error::PoolTimedOut));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "DESTINATION_UNAVAILABLE");
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) = render(AppError::InternalError("join error: panic".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }
}
