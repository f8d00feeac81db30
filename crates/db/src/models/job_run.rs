//! Job run entity: the outcome record of one batch execution.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use synth_core::types::{DbId, Timestamp};

use super::status::{JobRunStatus, StatusId};

/// A row from the `job_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRun {
    pub id: DbId,
    pub job_id: DbId,
    pub status_id: StatusId,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub records_generated: i64,
    pub avg_latency_ms: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRun {
    pub fn status(&self) -> Option<JobRunStatus> {
        JobRunStatus::from_id(self.status_id)
    }
}

/// Query parameters for listing a job's runs.
#[derive(Debug, Default, Deserialize)]
pub struct JobRunListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
