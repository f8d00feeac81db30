//! Destination inserter: writes transformed rows into an external database.
//!
//! A job's destination is an arbitrary relational database identified by a
//! driver DSN. Every [`DestinationInserter::insert_batch`] call opens its own
//! connection, discovers the target table's columns, and inserts the whole
//! batch in one transaction.

pub mod catalog;
pub mod dialect;
pub mod error;
pub mod plan;
pub mod sql;

use async_trait::async_trait;
use synth_core::types::Record;

pub use catalog::TableCatalog;
pub use dialect::Dialect;
pub use error::InsertError;
pub use plan::{plan_batch, plan_inserts, InsertStatement};
pub use sql::SqlInserter;

/// Inserts batches of rows into a destination table.
#[async_trait]
pub trait DestinationInserter: Send + Sync {
    /// Insert `rows` into `table` of the database at `dsn`, all or nothing.
    ///
    /// An empty batch succeeds without connecting.
    async fn insert_batch(&self, dsn: &str, table: &str, rows: &[Record])
        -> Result<(), InsertError>;
}
