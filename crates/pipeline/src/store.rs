//! Metadata access needed by the engines.

use async_trait::async_trait;
use sqlx::PgPool;
use synth_core::error::CoreError;
use synth_core::types::DbId;
use synth_db::models::job_run::JobRun;
use synth_db::repositories::{ConnectionRepo, JobMappingRepo, JobRepo, JobRunRepo, SchemaRepo};

use crate::{EngineError, JobContext};

/// Reads job definitions and writes run records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load a job with its schema, destination and mappings.
    ///
    /// Fails with [`CoreError::NotFound`] if the job or anything it
    /// references is missing.
    async fn load_job(&self, job_id: DbId) -> Result<JobContext, EngineError>;

    /// Persist a new `Started` run.
    async fn create_run(&self, job_id: DbId) -> Result<JobRun, EngineError>;

    async fn finish_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        avg_latency_ms: Option<i32>,
    ) -> Result<(), EngineError>;

    async fn fail_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        error_message: &str,
    ) -> Result<(), EngineError>;
}

/// [`JobStore`] over the Postgres metadata database.
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn load_job(&self, job_id: DbId) -> Result<JobContext, EngineError> {
        let job = JobRepo::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Job",
                id: job_id,
            })?;

        let schema = SchemaRepo::find_by_id(&self.pool, job.schema_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Schema",
                id: job.schema_id,
            })?;

        let destination = match job.destination_id {
            Some(id) => Some(ConnectionRepo::find_by_id(&self.pool, id).await?.ok_or(
                CoreError::NotFound {
                    entity: "DatabaseConnection",
                    id,
                },
            )?),
            None => None,
        };

        let mappings = JobMappingRepo::list_by_job(&self.pool, job_id).await?;

        Ok(JobContext {
            job,
            schema,
            destination,
            mappings,
        })
    }

    async fn create_run(&self, job_id: DbId) -> Result<JobRun, EngineError> {
        Ok(JobRunRepo::start(&self.pool, job_id).await?)
    }

    async fn finish_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        avg_latency_ms: Option<i32>,
    ) -> Result<(), EngineError> {
        let updated =
            JobRunRepo::finish(&self.pool, run_id, records_generated, avg_latency_ms).await?;
        if updated.is_none() {
            tracing::warn!(job_run_id = run_id, "Run was not in Started state; finish ignored");
        }
        Ok(())
    }

    async fn fail_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        error_message: &str,
    ) -> Result<(), EngineError> {
        let updated =
            JobRunRepo::fail(&self.pool, run_id, records_generated, error_message).await?;
        if updated.is_none() {
            tracing::warn!(job_run_id = run_id, "Run was not in Started state; failure ignored");
        }
        Ok(())
    }
}
