//! Kafka backend.
//!
//! Each record is sent as its own JSON message. `publish` returns only after
//! the producer has been flushed and every delivery report is in.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer};
use synth_core::types::Record;

use crate::{BusError, PublisherFactory, RecordPublisher};

/// Producer settings.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated `host:port` list.
    pub bootstrap_servers: String,
    /// Per-message delivery timeout (`message.timeout.ms`).
    pub message_timeout: Duration,
    /// Upper bound on a single flush.
    pub flush_timeout: Duration,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            message_timeout: Duration::from_secs(5),
            flush_timeout: Duration::from_secs(10),
        }
    }
}

/// Creates one [`KafkaPublisher`] per run.
#[derive(Debug, Clone)]
pub struct KafkaPublisherFactory {
    config: KafkaConfig,
}

impl KafkaPublisherFactory {
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

impl PublisherFactory for KafkaPublisherFactory {
    fn open(&self) -> Box<dyn RecordPublisher> {
        Box::new(KafkaPublisher::connect(&self.config))
    }
}

pub struct KafkaPublisher {
    /// `None` when the producer could not be created.
    producer: Option<FutureProducer>,
    flush_timeout: Duration,
}

impl KafkaPublisher {
    /// Build a producer from `config`.
    ///
    /// Creation failures are logged and leave the publisher disconnected
    /// rather than failing the caller.
    pub fn connect(config: &KafkaConfig) -> Self {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("acks", "all")
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            )
            .create::<FutureProducer>();

        match producer {
            Ok(producer) => Self {
                producer: Some(producer),
                flush_timeout: config.flush_timeout,
            },
            Err(e) => {
                tracing::error!(
                    bootstrap_servers = %config.bootstrap_servers,
                    error = %e,
                    "Failed to create Kafka producer",
                );
                Self::disconnected(config.flush_timeout)
            }
        }
    }

    /// A publisher with no producer behind it.
    pub fn disconnected(flush_timeout: Duration) -> Self {
        Self {
            producer: None,
            flush_timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.producer.is_some()
    }

    /// `Producer::flush` blocks, so it runs on the blocking pool.
    async fn flush(&self, producer: &FutureProducer) -> Result<(), BusError> {
        let producer = producer.clone();
        let timeout = self.flush_timeout;
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| BusError::Flush(e.to_string()))?
            .map_err(|e| BusError::Flush(e.to_string()))
    }
}

#[async_trait]
impl RecordPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, records: &[Record]) -> Result<(), BusError> {
        let Some(producer) = &self.producer else {
            return Err(BusError::Unavailable(
                "Kafka producer is not connected".to_string(),
            ));
        };

        let mut deliveries: Vec<DeliveryFuture> = Vec::with_capacity(records.len());
        for record in records {
            let payload = serde_json::to_vec(record)?;
            let message = FutureRecord::<(), [u8]>::to(topic).payload(payload.as_slice());
            let delivery = producer
                .send_result(message)
                .map_err(|(e, _)| BusError::Delivery(e.to_string()))?;
            deliveries.push(delivery);
        }

        self.flush(producer).await?;

        for result in futures::future::join_all(deliveries).await {
            match result {
                Ok(Ok(_)) => {}
                Ok(Err((e, _))) => return Err(BusError::Delivery(e.to_string())),
                Err(_canceled) => {
                    return Err(BusError::Delivery(
                        "delivery report dropped by producer".to_string(),
                    ))
                }
            }
        }

        tracing::debug!(topic, count = records.len(), "Published records to Kafka");
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        match &self.producer {
            Some(producer) => self.flush(producer).await,
            None => Ok(()),
        }
    }
}
