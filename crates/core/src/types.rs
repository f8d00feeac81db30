/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// One generated record: a flat JSON object keyed by schema field name.
///
/// The same shape is used for transformed destination rows, where the keys
/// are destination column names instead.
pub type Record = serde_json::Map<String, serde_json::Value>;
