#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Flush failed: {0}")]
    Flush(String),
}
