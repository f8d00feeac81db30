//! Schema-field → destination-column transform.
//!
//! A job mapping renames generated record keys to the column names of one
//! destination table. Pairs whose field is missing from a record are left
//! out of that row (never null-filled), and rows left with no columns are
//! dropped.

use std::collections::BTreeMap;

use crate::types::Record;

/// Schema field name → destination column name.
pub type FieldMappings = BTreeMap<String, String>;

/// Apply `mappings` to a single record.
///
/// Returns `None` when no mapped field is present in the record.
pub fn transform_record(record: &Record, mappings: &FieldMappings) -> Option<Record> {
    let row: Record = mappings
        .iter()
        .filter_map(|(field, column)| {
            record
                .get(field)
                .map(|value| (column.clone(), value.clone()))
        })
        .collect();

    (!row.is_empty()).then_some(row)
}

/// Apply `mappings` to a batch, dropping rows that end up empty.
pub fn transform_batch(records: &[Record], mappings: &FieldMappings) -> Vec<Record> {
    records
        .iter()
        .filter_map(|record| transform_record(record, mappings))
        .collect()
}
