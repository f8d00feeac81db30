use std::sync::Arc;

use synth_bus::{KafkaPublisherFactory, MemoryBus, PublisherFactory};
use synth_destination::SqlInserter;
use synth_generator::{RecordGenerator, SubprocessGenerator};
use synth_pipeline::{JobExecutor, JobStore, PgJobStore, StreamEngine};
use tokio_util::sync::CancellationToken;

use crate::config::{BusBackend, EngineConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Metadata database connection pool.
    pub pool: synth_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Batch run executor. Shared so the same-job lease covers every request.
    pub executor: Arc<JobExecutor>,
    /// Live streaming sessions.
    pub streams: StreamEngine,
    /// Destination catalog lookups.
    pub destinations: SqlInserter,
    /// Cancelled on shutdown; every stream session runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the production engine: Postgres metadata store, subprocess
    /// generator, the configured bus and the SQL destination inserter.
    pub fn new(
        pool: synth_db::DbPool,
        config: ServerConfig,
        engine: &EngineConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
        let generator: Arc<dyn RecordGenerator> =
            Arc::new(SubprocessGenerator::new(engine.generator.clone()));
        let publishers = build_publishers(engine);

        let executor = JobExecutor::new(
            Arc::clone(&store),
            Arc::clone(&generator),
            publishers,
            Arc::new(SqlInserter::new()),
        );
        let destinations = SqlInserter::new();
        let streams = StreamEngine::new(store, generator).with_buffer(engine.stream_buffer);

        Self {
            pool,
            config: Arc::new(config),
            executor: Arc::new(executor),
            streams,
            destinations,
            shutdown,
        }
    }
}

fn build_publishers(engine: &EngineConfig) -> Arc<dyn PublisherFactory> {
    match engine.bus {
        BusBackend::Kafka => {
            tracing::info!(
                bootstrap_servers = %engine.kafka.bootstrap_servers,
                "Publishing generated records to Kafka",
            );
            Arc::new(KafkaPublisherFactory::new(engine.kafka.clone()))
        }
        BusBackend::Memory => {
            let bus = MemoryBus::default();
            let mut rx = bus.subscribe();
            tokio::spawn(async move {
                use tokio::sync::broadcast::error::RecvError;
                loop {
                    match rx.recv().await {
                        Ok(published) => {
                            tracing::debug!(topic = %published.topic, "Record published");
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Bus logger lagged behind");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            tracing::info!("Publishing generated records to the in-process bus");
            Arc::new(bus)
        }
    }
}
