//! In-process bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`MemoryBus`] is shared across the application; each run gets a
//! [`BroadcastPublisher`] cloned from it. Subscribers see every record
//! published after they subscribed.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use synth_core::types::{Record, Timestamp};
use tokio::sync::broadcast;

use crate::{BusError, PublisherFactory, RecordPublisher};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// A record as seen by a [`MemoryBus`] subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRecord {
    pub topic: String,
    pub record: Record,
    pub published_at: Timestamp,
}

/// In-process fan-out bus.
///
/// When the buffer is full the oldest unread records are dropped and slow
/// receivers observe `RecvError::Lagged`.
#[derive(Clone)]
pub struct MemoryBus {
    sender: broadcast::Sender<PublishedRecord>,
}

impl MemoryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to every record published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedRecord> {
        self.sender.subscribe()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PublisherFactory for MemoryBus {
    fn open(&self) -> Box<dyn RecordPublisher> {
        Box::new(BroadcastPublisher {
            sender: self.sender.clone(),
        })
    }
}

pub struct BroadcastPublisher {
    sender: broadcast::Sender<PublishedRecord>,
}

#[async_trait]
impl RecordPublisher for BroadcastPublisher {
    async fn publish(&self, topic: &str, records: &[Record]) -> Result<(), BusError> {
        let published_at = Utc::now();
        for record in records {
            // A send error only means there are no subscribers.
            let _ = self.sender.send(PublishedRecord {
                topic: topic.to_string(),
                record: record.clone(),
                published_at,
            });
        }
        tracing::debug!(topic, count = records.len(), "Published records to memory bus");
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
