//! Job entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use synth_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub name: String,
    pub status_id: StatusId,
    pub schema_id: DbId,
    pub destination_id: Option<DbId>,
    pub simulation_rules: Option<serde_json::Value>,
    pub output_settings: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a job.
#[derive(Debug, Deserialize)]
pub struct CreateJob {
    pub name: String,
    pub status_id: Option<StatusId>,
    pub schema_id: DbId,
    pub destination_id: Option<DbId>,
    pub simulation_rules: Option<serde_json::Value>,
    pub output_settings: Option<serde_json::Value>,
}
