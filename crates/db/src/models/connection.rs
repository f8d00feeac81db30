//! Destination database connection entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use synth_core::types::{DbId, Timestamp};

/// A row from the `database_connections` table.
///
/// `details` is the driver connection string and is never serialized back
/// to clients.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DatabaseConnection {
    pub id: DbId,
    pub name: String,
    pub conn_type: String,
    pub status: String,
    #[serde(skip_serializing)]
    pub details: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a destination connection.
#[derive(Debug, Deserialize)]
pub struct CreateDatabaseConnection {
    pub name: String,
    pub conn_type: String,
    pub details: String,
}
