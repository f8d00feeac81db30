//! Repository for the `database_connections` table.

use sqlx::PgPool;
use synth_core::types::DbId;

use crate::models::connection::{CreateDatabaseConnection, DatabaseConnection};

/// Column list for `database_connections` queries.
const COLUMNS: &str = "id, name, conn_type, status, details, created_at, updated_at";

pub struct ConnectionRepo;

impl ConnectionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDatabaseConnection,
    ) -> Result<DatabaseConnection, sqlx::Error> {
        let query = format!(
            "INSERT INTO database_connections (name, conn_type, details) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatabaseConnection>(&query)
            .bind(&input.name)
            .bind(&input.conn_type)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DatabaseConnection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM database_connections WHERE id = $1");
        sqlx::query_as::<_, DatabaseConnection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
