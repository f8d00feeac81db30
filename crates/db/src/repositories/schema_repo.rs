//! Repository for the `schemas` table.

use sqlx::types::Json;
use sqlx::PgPool;
use synth_core::types::DbId;

use crate::models::schema::{CreateSchema, Schema};

/// Column list for `schemas` queries.
const COLUMNS: &str = "id, name, description, version, fields, created_at, updated_at";

pub struct SchemaRepo;

impl SchemaRepo {
    pub async fn create(pool: &PgPool, input: &CreateSchema) -> Result<Schema, sqlx::Error> {
        let query = format!(
            "INSERT INTO schemas (name, description, version, fields) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schema>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.version)
            .bind(Json(&input.fields))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Schema>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schemas WHERE id = $1");
        sqlx::query_as::<_, Schema>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
