//! Repository for the `job_mappings` table.
//!
//! `(job_id, table_name)` is unique (`uq_job_mappings_job_table`), so a
//! duplicate `create` surfaces as a unique violation.

use sqlx::types::Json;
use sqlx::PgPool;
use synth_core::types::DbId;

use crate::models::job_mapping::{CreateJobMapping, JobMapping};

/// Column list for `job_mappings` queries.
const COLUMNS: &str = "id, job_id, table_name, field_mappings, created_at, updated_at";

pub struct JobMappingRepo;

impl JobMappingRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateJobMapping,
    ) -> Result<JobMapping, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_mappings (job_id, table_name, field_mappings) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobMapping>(&query)
            .bind(input.job_id)
            .bind(&input.table_name)
            .bind(Json(&input.field_mappings))
            .fetch_one(pool)
            .await
    }

    /// All mappings of a job, in creation order.
    pub async fn list_by_job(pool: &PgPool, job_id: DbId) -> Result<Vec<JobMapping>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_mappings WHERE job_id = $1 ORDER BY id");
        sqlx::query_as::<_, JobMapping>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }
}
