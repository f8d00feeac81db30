//! Repository for the `jobs` table.
//!
//! The engine only reads jobs; `create` exists for seeding and tests.

use sqlx::PgPool;
use synth_core::types::DbId;

use crate::models::job::{CreateJob, Job};
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, name, status_id, schema_id, destination_id, \
    simulation_rules, output_settings, created_at, updated_at";

pub struct JobRepo;

impl JobRepo {
    pub async fn create(pool: &PgPool, input: &CreateJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs \
                 (name, status_id, schema_id, destination_id, simulation_rules, output_settings) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(&input.name)
            .bind(input.status_id.unwrap_or(JobStatus::Draft.id()))
            .bind(input.schema_id)
            .bind(input.destination_id)
            .bind(&input.simulation_rules)
            .bind(&input.output_settings)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
