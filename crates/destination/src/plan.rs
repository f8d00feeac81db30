//! Turning a batch of rows into parameterised INSERT statements.
//!
//! Planning is pure apart from the column lookup, so the whole validation
//! path can be exercised against a fake [`TableCatalog`].

use std::collections::HashSet;

use serde_json::Value;
use synth_core::types::Record;

use crate::{Dialect, InsertError, TableCatalog};

/// One row's INSERT with its values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Look up `table` through `catalog` and plan the batch against its columns.
pub async fn plan_batch<C>(
    catalog: &mut C,
    dialect: Dialect,
    table: &str,
    rows: &[Record],
) -> Result<Vec<InsertStatement>, InsertError>
where
    C: TableCatalog + ?Sized,
{
    let columns = catalog.describe_table(table).await?;
    plan_inserts(dialect, table, &columns, rows)
}

/// Build one INSERT per row.
///
/// Every key of every row is checked against `columns` before anything is
/// planned. Each row lists only its own keys, so rows may omit columns.
pub fn plan_inserts(
    dialect: Dialect,
    table: &str,
    columns: &[String],
    rows: &[Record],
) -> Result<Vec<InsertStatement>, InsertError> {
    if columns.is_empty() {
        return Err(InsertError::TableNotFound(table.to_string()));
    }

    let known: HashSet<&str> = columns.iter().map(String::as_str).collect();
    if let Some(column) = rows
        .iter()
        .flat_map(|row| row.keys())
        .find(|key| !known.contains(key.as_str()))
    {
        return Err(InsertError::UnknownColumn {
            table: table.to_string(),
            column: column.clone(),
        });
    }

    let quoted_table = dialect.quote(table);
    let statements = rows
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let column_list = row
                .keys()
                .map(|c| dialect.quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=row.len())
                .map(|n| dialect.placeholder(n))
                .collect::<Vec<_>>()
                .join(", ");

            InsertStatement {
                sql: format!("INSERT INTO {quoted_table} ({column_list}) VALUES ({placeholders})"),
                values: row.values().cloned().collect(),
            }
        })
        .collect();

    Ok(statements)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
