//! Record schema entity.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use synth_core::schema::{SchemaDefinition, SchemaField};
use synth_core::types::{DbId, Timestamp};

/// A row from the `schemas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Schema {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub fields: Json<Vec<SchemaField>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Schema {
    /// The field list in the form handed to the generator.
    pub fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::new(self.fields.0.clone())
    }
}

/// DTO for creating a schema.
#[derive(Debug, Deserialize)]
pub struct CreateSchema {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub fields: Vec<SchemaField>,
}
