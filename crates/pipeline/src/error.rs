use synth_core::error::CoreError;
use synth_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Not found, conflicting run, or invalid job settings. No run is created.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The run was created and has been marked Failed.
    #[error("Job run {run_id} failed: {message}")]
    RunFailed { run_id: DbId, message: String },
}
