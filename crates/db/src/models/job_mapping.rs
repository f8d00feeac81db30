//! Job mapping entity: schema field → column names for one destination table.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use synth_core::mapping::FieldMappings;
use synth_core::types::{DbId, Timestamp};

/// A row from the `job_mappings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobMapping {
    pub id: DbId,
    pub job_id: DbId,
    pub table_name: String,
    pub field_mappings: Json<FieldMappings>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a job mapping.
#[derive(Debug, Deserialize)]
pub struct CreateJobMapping {
    pub job_id: DbId,
    pub table_name: String,
    pub field_mappings: FieldMappings,
}
