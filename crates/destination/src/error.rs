#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("Unsupported destination DSN: {0}")]
    UnsupportedDsn(String),

    #[error("Failed to connect to destination: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Destination database error: {0}")]
    Database(#[from] sqlx::Error),
}
