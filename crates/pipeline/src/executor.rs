//! Batch job execution.
//!
//! One call to [`JobExecutor::execute_job`] is one run: the job is loaded,
//! a `Started` run is persisted, `generationFrequency` records are produced
//! in chunks of [`CHUNK_SIZE`], and the run is closed as `Finished` or
//! `Failed`. Publish failures are logged and skipped; generator and insert
//! failures end the run. Nothing is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use synth_bus::{PublisherFactory, RecordPublisher};
use synth_core::chunking::{plan_chunks, CHUNK_SIZE, SAMPLE_SIZE};
use synth_core::error::CoreError;
use synth_core::mapping::transform_batch;
use synth_core::types::{DbId, Record};
use synth_destination::DestinationInserter;
use synth_generator::RecordGenerator;

use crate::{ActiveRuns, EngineError, JobContext, JobStore};

/// `status` of a successful [`RunResult`].
pub const RUN_SUCCESS_STATUS: &str = "Success";

/// Summary returned for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub job_run_id: DbId,
    pub status: String,
    pub records_generated: i64,
    /// The first records generated, at most [`SAMPLE_SIZE`].
    pub sample_data: Vec<Record>,
}

pub struct JobExecutor {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn RecordGenerator>,
    publishers: Arc<dyn PublisherFactory>,
    inserter: Arc<dyn DestinationInserter>,
    chunk_size: usize,
    active_runs: ActiveRuns,
}

impl JobExecutor {
    pub fn new(
        store: Arc<dyn JobStore>,
        generator: Arc<dyn RecordGenerator>,
        publishers: Arc<dyn PublisherFactory>,
        inserter: Arc<dyn DestinationInserter>,
    ) -> Self {
        Self {
            store,
            generator,
            publishers,
            inserter,
            chunk_size: CHUNK_SIZE,
            active_runs: ActiveRuns::default(),
        }
    }

    /// Override the records requested per generator call.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn active_runs(&self) -> &ActiveRuns {
        &self.active_runs
    }

    /// Execute one run of `job_id`.
    ///
    /// Fails without creating a run if the job is missing, already running,
    /// or has unreadable settings. Once the run exists, every failure is
    /// recorded on it and returned as [`EngineError::RunFailed`].
    pub async fn execute_job(&self, job_id: DbId) -> Result<RunResult, EngineError> {
        let _lease = self.active_runs.try_acquire(job_id).ok_or_else(|| {
            CoreError::Conflict(format!("Job {job_id} already has a run in progress"))
        })?;

        let ctx = self.store.load_job(job_id).await?;
        let total = ctx.simulation_rules()?.generation_frequency();
        let output = ctx.output_settings()?;
        let topic = output.topic();

        let run = self.store.create_run(job_id).await?;
        tracing::info!(job_id, job_run_id = run.id, total, topic, "Job run started");

        let publisher = self.publishers.open();
        let outcome = self
            .run_chunks(&ctx, total, topic, publisher.as_ref(), run.id)
            .await;
        if let Err(e) = publisher.close().await {
            tracing::warn!(job_run_id = run.id, error = %e, "Failed to close publisher");
        }

        match outcome {
            Ok(progress) => {
                let avg_latency_ms = progress.avg_latency_ms();
                if let Err(e) = self
                    .store
                    .finish_run(run.id, progress.records_generated, avg_latency_ms)
                    .await
                {
                    let message = format!("Failed to record run completion: {e}");
                    tracing::error!(
                        job_id,
                        job_run_id = run.id,
                        error = %e,
                        "Job run could not be finished",
                    );
                    self.record_failure(run.id, progress.records_generated, &message)
                        .await;
                    return Err(EngineError::RunFailed {
                        run_id: run.id,
                        message,
                    });
                }

                tracing::info!(
                    job_id,
                    job_run_id = run.id,
                    records_generated = progress.records_generated,
                    avg_latency_ms,
                    "Job run finished",
                );

                Ok(RunResult {
                    job_run_id: run.id,
                    status: RUN_SUCCESS_STATUS.to_string(),
                    records_generated: progress.records_generated,
                    sample_data: progress.sample,
                })
            }
            Err(failure) => {
                tracing::error!(
                    job_id,
                    job_run_id = run.id,
                    records_generated = failure.records_generated,
                    error = %failure.message,
                    "Job run failed",
                );

                self.record_failure(run.id, failure.records_generated, &failure.message)
                    .await;

                Err(EngineError::RunFailed {
                    run_id: run.id,
                    message: failure.message,
                })
            }
        }
    }

    /// Mark a run Failed. A store error here is only logged; the caller
    /// already reports the failure with the run id.
    async fn record_failure(&self, run_id: DbId, records_generated: i64, message: &str) {
        if let Err(e) = self.store.fail_run(run_id, records_generated, message).await {
            tracing::error!(job_run_id = run_id, error = %e, "Failed to record run failure");
        }
    }

    async fn run_chunks(
        &self,
        ctx: &JobContext,
        total: i64,
        topic: &str,
        publisher: &dyn RecordPublisher,
        run_id: DbId,
    ) -> Result<RunProgress, ChunkFailure> {
        let schema = ctx.schema.definition();
        let targets = ctx.insert_targets();
        let plan = plan_chunks(total, self.chunk_size);
        let chunk_count = plan.len();
        let mut progress = RunProgress::default();

        for (index, requested) in plan.enumerate() {
            let chunk = index + 1;
            let started = Instant::now();

            let mut records = match self.generator.generate(&schema, requested).await {
                Ok(records) => records,
                Err(e) => {
                    return Err(progress.fail(format!(
                        "Generator failed on chunk {chunk}/{chunk_count}: {e}"
                    )))
                }
            };

            if records.len() > requested {
                tracing::warn!(
                    job_run_id = run_id,
                    chunk,
                    requested,
                    returned = records.len(),
                    "Generator over-delivered; truncating chunk",
                );
                records.truncate(requested);
            } else if records.len() < requested {
                tracing::warn!(
                    job_run_id = run_id,
                    chunk,
                    requested,
                    returned = records.len(),
                    shortfall = requested - records.len(),
                    "Generator under-delivered",
                );
            }

            progress.record_chunk(&records);

            if !records.is_empty() {
                if let Err(e) = publisher.publish(topic, &records).await {
                    tracing::warn!(
                        job_run_id = run_id,
                        topic,
                        chunk,
                        count = records.len(),
                        error = %e,
                        "Failed to publish chunk",
                    );
                }
            }

            if let Some((destination, mappings)) = targets {
                for mapping in mappings {
                    let rows = transform_batch(&records, &mapping.field_mappings.0);
                    if rows.is_empty() {
                        continue;
                    }
                    if let Err(e) = self
                        .inserter
                        .insert_batch(&destination.details, &mapping.table_name, &rows)
                        .await
                    {
                        return Err(progress.fail(format!(
                            "Insert into '{}' failed on chunk {chunk}/{chunk_count}: {e}",
                            mapping.table_name
                        )));
                    }
                    tracing::debug!(
                        job_run_id = run_id,
                        table = %mapping.table_name,
                        count = rows.len(),
                        "Chunk inserted",
                    );
                }
            }

            progress.chunk_latencies.push(started.elapsed());
        }

        Ok(progress)
    }
}

// ---------------------------------------------------------------------------
// Run accounting
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RunProgress {
    records_generated: i64,
    sample: Vec<Record>,
    chunk_latencies: Vec<Duration>,
}

impl RunProgress {
    /// Count a generated chunk and top up the sample.
    fn record_chunk(&mut self, records: &[Record]) {
        self.records_generated += records.len() as i64;
        let room = SAMPLE_SIZE.saturating_sub(self.sample.len());
        self.sample.extend(records.iter().take(room).cloned());
    }

    /// Mean latency of completed chunks, `None` when none completed.
    fn avg_latency_ms(&self) -> Option<i32> {
        if self.chunk_latencies.is_empty() {
            return None;
        }
        let total: Duration = self.chunk_latencies.iter().sum();
        let mean = total.as_millis() / self.chunk_latencies.len() as u128;
        Some(i32::try_from(mean).unwrap_or(i32::MAX))
    }

    fn fail(self, message: String) -> ChunkFailure {
        ChunkFailure {
            records_generated: self.records_generated,
            message,
        }
    }
}

struct ChunkFailure {
    records_generated: i64,
    message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
