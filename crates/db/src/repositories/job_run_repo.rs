//! Repository for the `job_runs` table.
//!
//! A run is created `Started` and makes exactly one terminal transition.
//! `finish` and `fail` only update rows that are still `Started`, so a
//! terminal run is never overwritten.

use sqlx::PgPool;
use synth_core::types::DbId;

use crate::models::job_run::{JobRun, JobRunListQuery};
use crate::models::status::JobRunStatus;

/// Column list for `job_runs` queries.
const COLUMNS: &str = "\
    id, job_id, status_id, started_at, finished_at, \
    records_generated, avg_latency_ms, error_message, \
    created_at, updated_at";

/// Maximum page size for run listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for run listing.
const DEFAULT_LIMIT: i64 = 50;

pub struct JobRunRepo;

impl JobRunRepo {
    /// Insert a new `Started` run for a job.
    pub async fn start(pool: &PgPool, job_id: DbId) -> Result<JobRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_runs (job_id, status_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRun>(&query)
            .bind(job_id)
            .bind(JobRunStatus::Started.id())
            .fetch_one(pool)
            .await
    }

    /// Transition a started run to `Finished`.
    ///
    /// Returns `None` if the run does not exist or is already terminal.
    pub async fn finish(
        pool: &PgPool,
        run_id: DbId,
        records_generated: i64,
        avg_latency_ms: Option<i32>,
    ) -> Result<Option<JobRun>, sqlx::Error> {
        let query = format!(
            "UPDATE job_runs \
             SET status_id = $2, finished_at = NOW(), \
                 records_generated = $3, avg_latency_ms = $4 \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRun>(&query)
            .bind(run_id)
            .bind(JobRunStatus::Finished.id())
            .bind(records_generated)
            .bind(avg_latency_ms)
            .bind(JobRunStatus::Started.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition a started run to `Failed` with an error message.
    ///
    /// `records_generated` is the count accumulated before the failure.
    /// Returns `None` if the run does not exist or is already terminal.
    pub async fn fail(
        pool: &PgPool,
        run_id: DbId,
        records_generated: i64,
        error: &str,
    ) -> Result<Option<JobRun>, sqlx::Error> {
        let query = format!(
            "UPDATE job_runs \
             SET status_id = $2, finished_at = NOW(), \
                 records_generated = $3, error_message = $4 \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRun>(&query)
            .bind(run_id)
            .bind(JobRunStatus::Failed.id())
            .bind(records_generated)
            .bind(error)
            .bind(JobRunStatus::Started.id())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<JobRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_runs WHERE id = $1");
        sqlx::query_as::<_, JobRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A job's runs, newest first.
    pub async fn list_by_job(
        pool: &PgPool,
        job_id: DbId,
        params: &JobRunListQuery,
    ) -> Result<Vec<JobRun>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM job_runs \
             WHERE job_id = $1 \
             ORDER BY started_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, JobRun>(&query)
            .bind(job_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
