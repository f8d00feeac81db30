//! Live single-record generation stream.
//!
//! A session generates one record, hands it to the consumer, waits
//! `1 / generationFrequency` seconds and repeats until the consumer goes
//! away, the session is cancelled, or the generator fails. Streaming never
//! creates a run record.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use synth_core::types::{DbId, Record};
use synth_generator::RecordGenerator;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::JobStore;

/// Default number of records buffered between the session and its consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// Lifecycle of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Idle,
    Streaming,
    /// Consumer disconnected or the session was cancelled.
    Cancelled,
    /// The job could not be loaded or the generator failed.
    Errored,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Errored)
    }
}

/// Starts streaming sessions.
#[derive(Clone)]
pub struct StreamEngine {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn RecordGenerator>,
    buffer: usize,
}

impl StreamEngine {
    pub fn new(store: Arc<dyn JobStore>, generator: Arc<dyn RecordGenerator>) -> Self {
        Self {
            store,
            generator,
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Spawn a session for `job_id`. It runs until `cancel` fires, the
    /// session's receiver is dropped, or generation fails.
    pub fn start(&self, job_id: DbId, cancel: CancellationToken) -> StreamSession {
        let (tx, records) = mpsc::channel(self.buffer);
        let (state_tx, state) = watch::channel(StreamState::Idle);

        let session = StreamTask {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            job_id,
            tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(session.run());

        StreamSession {
            records,
            state,
            cancel,
            handle,
        }
    }
}

/// Consumer side of a running session.
pub struct StreamSession {
    pub records: mpsc::Receiver<Record>,
    state: watch::Receiver<StreamState>,
    cancel: CancellationToken,
    handle: JoinHandle<StreamState>,
}

impl StreamSession {
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Split into the record receiver and the handle yielding the final state.
    pub fn into_parts(self) -> (mpsc::Receiver<Record>, JoinHandle<StreamState>) {
        (self.records, self.handle)
    }
}

struct StreamTask {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn RecordGenerator>,
    job_id: DbId,
    tx: mpsc::Sender<Record>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
}

impl StreamTask {
    async fn run(self) -> StreamState {
        let job_id = self.job_id;
        let final_state = self.stream().await;
        self.state.send_replace(final_state);
        tracing::info!(job_id, state = ?final_state, "Closing job stream");
        final_state
    }

    async fn stream(&self) -> StreamState {
        let job_id = self.job_id;

        let ctx = match self.store.load_job(job_id).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Cannot stream job");
                return StreamState::Errored;
            }
        };
        let delay = match ctx.simulation_rules() {
            Ok(rules) => rules.stream_delay(),
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Cannot stream job");
                return StreamState::Errored;
            }
        };
        let schema = ctx.schema.definition();

        self.state.send_replace(StreamState::Streaming);
        tracing::info!(job_id, delay_ms = delay.as_millis() as u64, "Job stream started");

        loop {
            // Dropping the generate future kills a subprocess generator.
            let generated = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return StreamState::Cancelled,
                _ = self.tx.closed() => return StreamState::Cancelled,
                result = self.generator.generate(&schema, 1) => result,
            };

            match generated {
                Ok(records) => {
                    if let Some(record) = records.into_iter().next() {
                        tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => return StreamState::Cancelled,
                            sent = self.tx.send(record) => {
                                if sent.is_err() {
                                    return StreamState::Cancelled;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "Generator failed; ending stream");
                    return StreamState::Errored;
                }
            }

            if !self.pause(delay).await {
                return StreamState::Cancelled;
            }
        }
    }

    /// Wait out the inter-record delay. Returns `false` if the session ended
    /// meanwhile.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = self.tx.closed() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{job_context, FakeStore, ScriptedGenerator};

    fn engine_with(
        frequency: i64,
        generator: ScriptedGenerator,
    ) -> (StreamEngine, Arc<ScriptedGenerator>, Arc<FakeStore>) {
        let store = Arc::new(FakeStore::new());
        store.insert_job(job_context(
            1,
            &["id", "name"],
            Some(json!({"generationFrequency": frequency})),
        ));
        let generator = Arc::new(generator);
        let engine = StreamEngine::new(store.clone(), generator.clone());
        (engine, generator, store)
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_record_per_interval() {
        let (engine, generator, _store) = engine_with(2, ScriptedGenerator::new());
        let mut session = engine.start(1, CancellationToken::new());

        let started = tokio::time::Instant::now();
        for _ in 0..3 {
            let record = session.records.recv().await.unwrap();
            assert!(record.contains_key("id") && record.contains_key("name"));
        }
        // Two 500 ms pauses separate three records.
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(session.state(), StreamState::Streaming);
        assert!(generator.calls().iter().all(|&n| n == 1));

        session.cancel();
        let (_records, handle) = session.into_parts();
        assert_eq!(handle.await.unwrap(), StreamState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_mid_delay_stops_generation() {
        let (engine, generator, _store) = engine_with(1, ScriptedGenerator::new());
        let cancel = CancellationToken::new();
        let mut session = engine.start(1, cancel.clone());

        session.records.recv().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();

        let (mut records, handle) = session.into_parts();
        assert_eq!(handle.await.unwrap(), StreamState::Cancelled);
        assert_eq!(generator.calls().len(), 1);
        assert!(records.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_during_generation_emits_nothing() {
        let (engine, generator, _store) =
            engine_with(1, ScriptedGenerator::new().with_delay(Duration::from_secs(5)));
        let session = engine.start(1, CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(1)).await;
        session.cancel();

        let (mut records, handle) = session.into_parts();
        assert_eq!(handle.await.unwrap(), StreamState::Cancelled);
        assert_eq!(generator.calls().len(), 1);
        assert!(records.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_receiver_ends_the_session() {
        let (engine, generator, _store) = engine_with(1, ScriptedGenerator::new());
        let session = engine.start(1, CancellationToken::new());

        let (mut records, handle) = session.into_parts();
        records.recv().await.unwrap();
        drop(records);

        assert_eq!(handle.await.unwrap(), StreamState::Cancelled);
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn generator_error_ends_stream_without_retry() {
        let (engine, generator, _store) =
            engine_with(10, ScriptedGenerator::new().failing_on_call(3));
        let session = engine.start(1, CancellationToken::new());

        let (mut records, handle) = session.into_parts();
        assert!(records.recv().await.is_some());
        assert!(records.recv().await.is_some());
        assert!(records.recv().await.is_none());

        assert_eq!(handle.await.unwrap(), StreamState::Errored);
        assert_eq!(generator.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_results_keep_the_loop_going() {
        let (engine, generator, _store) = engine_with(1, ScriptedGenerator::new().returning(0));
        let session = engine.start(1, CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(generator.calls().len() >= 3);

        session.cancel();
        let (mut records, handle) = session.into_parts();
        assert_eq!(handle.await.unwrap(), StreamState::Cancelled);
        assert!(records.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_job_ends_without_records() {
        let (engine, generator, _store) = engine_with(1, ScriptedGenerator::new());
        let session = engine.start(99, CancellationToken::new());

        let (mut records, handle) = session.into_parts();
        assert!(records.recv().await.is_none());
        assert_eq!(handle.await.unwrap(), StreamState::Errored);
        assert!(generator.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_frequency_waits_one_second() {
        let (engine, _generator, _store) = engine_with(0, ScriptedGenerator::new());
        let mut session = engine.start(1, CancellationToken::new());

        session.records.recv().await.unwrap();
        let after_first = tokio::time::Instant::now();
        session.records.recv().await.unwrap();
        assert!(after_first.elapsed() >= Duration::from_secs(1));

        session.cancel();
    }

    #[test]
    fn only_cancelled_and_errored_are_terminal() {
        assert!(!StreamState::Idle.is_terminal());
        assert!(!StreamState::Streaming.is_terminal());
        assert!(StreamState::Cancelled.is_terminal());
        assert!(StreamState::Errored.is_terminal());
    }
}
