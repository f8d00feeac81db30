//! [`DestinationInserter`] over `sqlx`'s `Any` driver.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Connection};
use synth_core::types::Record;

use crate::{
    plan_batch, DestinationInserter, Dialect, InsertError, InsertStatement, TableCatalog,
};

/// Connects to the destination DSN on every call.
#[derive(Debug, Clone, Copy)]
pub struct SqlInserter;

impl SqlInserter {
    pub fn new() -> Self {
        sqlx::any::install_default_drivers();
        Self
    }

    /// Column names of `table` at `dsn`, in ordinal order.
    ///
    /// A table with no columns is reported as [`InsertError::TableNotFound`].
    pub async fn describe_table(
        &self,
        dsn: &str,
        table: &str,
    ) -> Result<Vec<String>, InsertError> {
        Dialect::from_dsn(dsn)?;
        let mut conn = AnyConnection::connect(dsn)
            .await
            .map_err(InsertError::Connect)?;

        let columns = conn.describe_table(table).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(table, error = %e, "Failed to close destination connection");
        }

        let columns = columns?;
        if columns.is_empty() {
            return Err(InsertError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}

impl Default for SqlInserter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationInserter for SqlInserter {
    async fn insert_batch(
        &self,
        dsn: &str,
        table: &str,
        rows: &[Record],
    ) -> Result<(), InsertError> {
        if rows.is_empty() {
            return Ok(());
        }

        let dialect = Dialect::from_dsn(dsn)?;
        let mut conn = AnyConnection::connect(dsn)
            .await
            .map_err(InsertError::Connect)?;

        let result = insert_in_transaction(&mut conn, dialect, table, rows).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(table, error = %e, "Failed to close destination connection");
        }

        if result.is_ok() {
            tracing::debug!(table, count = rows.len(), "Inserted rows into destination");
        }
        result
    }
}

async fn insert_in_transaction(
    conn: &mut AnyConnection,
    dialect: Dialect,
    table: &str,
    rows: &[Record],
) -> Result<(), InsertError> {
    let statements = plan_batch(conn, dialect, table, rows).await?;

    let mut tx = conn.begin().await?;
    for statement in &statements {
        if let Err(e) = bind_values(statement).execute(&mut *tx).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(table, error = %rollback, "Rollback failed");
            }
            return Err(e.into());
        }
    }
    tx.commit().await?;

    Ok(())
}

/// Bind a statement's JSON values: scalars natively, arrays and objects as
/// their JSON text.
fn bind_values(statement: &InsertStatement) -> Query<'_, Any, AnyArguments<'_>> {
    statement
        .values
        .iter()
        .fold(sqlx::query(&statement.sql), |query, value| match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        })
}
