//! Message bus publishing for generated records.
//!
//! The engine opens one [`RecordPublisher`] per run through a
//! [`PublisherFactory`], publishes every chunk under the job's topic and
//! closes the publisher when the run ends. Two backends are provided:
//!
//! - [`kafka`]: `rdkafka` producer, one message per record, flushed per batch.
//! - [`memory`]: in-process broadcast fan-out for local runs and tests.

pub mod error;
pub mod kafka;
pub mod memory;

use async_trait::async_trait;
use synth_core::types::Record;

pub use error::BusError;
pub use kafka::{KafkaConfig, KafkaPublisher, KafkaPublisherFactory};
pub use memory::{BroadcastPublisher, MemoryBus, PublishedRecord};

/// Publishes batches of records to a topic.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Send every record in `records` to `topic` and wait until the bus has
    /// confirmed delivery of all of them.
    async fn publish(&self, topic: &str, records: &[Record]) -> Result<(), BusError>;

    /// Release the underlying connection, delivering anything still queued.
    async fn close(&self) -> Result<(), BusError>;
}

/// Hands out a publisher for the duration of one run.
pub trait PublisherFactory: Send + Sync {
    /// Open a publisher. Never fails: a backend that cannot connect returns a
    /// publisher whose [`RecordPublisher::publish`] reports
    /// [`BusError::Unavailable`].
    fn open(&self) -> Box<dyn RecordPublisher>;
}
