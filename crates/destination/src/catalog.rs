//! Column discovery for destination tables.

use async_trait::async_trait;
use sqlx::AnyConnection;

use crate::Dialect;

/// Looks up the columns of a table at call time.
#[async_trait]
pub trait TableCatalog: Send {
    /// Column names of `table` in ordinal order. Empty when the table does
    /// not exist.
    async fn describe_table(&mut self, table: &str) -> Result<Vec<String>, sqlx::Error>;
}

#[async_trait]
impl TableCatalog for AnyConnection {
    async fn describe_table(&mut self, table: &str) -> Result<Vec<String>, sqlx::Error> {
        let dialect = Dialect::from_backend_name(self.backend_name()).ok_or_else(|| {
            sqlx::Error::Configuration(
                format!("unsupported backend {}", self.backend_name()).into(),
            )
        })?;

        sqlx::query_scalar::<_, String>(dialect.columns_query())
            .bind(table)
            .fetch_all(&mut *self)
            .await
    }
}
