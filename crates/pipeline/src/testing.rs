//! In-memory fakes for the engine's collaborators.
//!
//! Available to this crate's tests and, through the `testing` feature, to
//! other crates' tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use synth_bus::{BusError, PublisherFactory, RecordPublisher};
use synth_core::error::CoreError;
use synth_core::mapping::FieldMappings;
use synth_core::schema::{SchemaDefinition, SchemaField};
use synth_core::types::{DbId, Record};
use synth_db::models::connection::DatabaseConnection;
use synth_db::models::job::Job;
use synth_db::models::job_mapping::JobMapping;
use synth_db::models::job_run::JobRun;
use synth_db::models::schema::Schema;
use synth_db::models::status::{JobRunStatus, JobStatus};
use synth_destination::{DestinationInserter, InsertError};
use synth_generator::{GeneratorError, RecordGenerator};

use crate::{EngineError, JobContext, JobStore};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A job over a schema with the given field names, no destination and no
/// mappings.
pub fn job_context(job_id: DbId, fields: &[&str], simulation_rules: Option<Value>) -> JobContext {
    let now = Utc::now();
    let schema = Schema {
        id: job_id * 100,
        name: format!("schema-{job_id}"),
        description: None,
        version: Some("1".to_string()),
        fields: Json(
            fields
                .iter()
                .map(|name| SchemaField {
                    id: format!("f_{name}"),
                    name: name.to_string(),
                    field_type: "string".to_string(),
                    required: true,
                    description: String::new(),
                })
                .collect(),
        ),
        created_at: now,
        updated_at: now,
    };

    JobContext {
        job: Job {
            id: job_id,
            name: format!("job-{job_id}"),
            status_id: JobStatus::Active.id(),
            schema_id: schema.id,
            destination_id: None,
            simulation_rules,
            output_settings: None,
            created_at: now,
            updated_at: now,
        },
        schema,
        destination: None,
        mappings: Vec::new(),
    }
}

pub fn destination(id: DbId, dsn: &str) -> DatabaseConnection {
    let now = Utc::now();
    DatabaseConnection {
        id,
        name: format!("destination-{id}"),
        conn_type: dsn.split(':').next().unwrap_or_default().to_string(),
        status: "Connected".to_string(),
        details: dsn.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn mapping(job_id: DbId, table: &str, pairs: &[(&str, &str)]) -> JobMapping {
    let now = Utc::now();
    let field_mappings: FieldMappings = pairs
        .iter()
        .map(|(field, column)| (field.to_string(), column.to_string()))
        .collect();
    JobMapping {
        id: 0,
        job_id,
        table_name: table.to_string(),
        field_mappings: Json(field_mappings),
        created_at: now,
        updated_at: now,
    }
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

/// Snapshot of a run held by [`FakeStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeRun {
    pub id: DbId,
    pub job_id: DbId,
    pub status: JobRunStatus,
    pub records_generated: i64,
    pub avg_latency_ms: Option<i32>,
    pub error_message: Option<String>,
}

#[derive(Default)]
pub struct FakeStore {
    jobs: Mutex<HashMap<DbId, JobContext>>,
    runs: Mutex<Vec<FakeRun>>,
    next_run_id: AtomicI64,
    finish_fails: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `finish_run` fail with a database error.
    pub fn failing_finish(mut self) -> Self {
        self.finish_fails = true;
        self
    }

    pub fn insert_job(&self, ctx: JobContext) {
        self.jobs.lock().unwrap().insert(ctx.job.id, ctx);
    }

    pub fn runs(&self) -> Vec<FakeRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run(&self, run_id: DbId) -> Option<FakeRun> {
        self.runs().into_iter().find(|r| r.id == run_id)
    }

    fn close_run(&self, run_id: DbId, update: impl FnOnce(&mut FakeRun)) {
        let mut runs = self.runs.lock().unwrap();
        if let Some(run) = runs
            .iter_mut()
            .find(|r| r.id == run_id && r.status == JobRunStatus::Started)
        {
            update(run);
        }
    }
}

#[async_trait]
impl JobStore for FakeStore {
    async fn load_job(&self, job_id: DbId) -> Result<JobContext, EngineError> {
        self.jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "Job",
                    id: job_id,
                }
                .into()
            })
    }

    async fn create_run(&self, job_id: DbId) -> Result<JobRun, EngineError> {
        let id = self.next_run_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.runs.lock().unwrap().push(FakeRun {
            id,
            job_id,
            status: JobRunStatus::Started,
            records_generated: 0,
            avg_latency_ms: None,
            error_message: None,
        });

        let now = Utc::now();
        Ok(JobRun {
            id,
            job_id,
            status_id: JobRunStatus::Started.id(),
            started_at: now,
            finished_at: None,
            records_generated: 0,
            avg_latency_ms: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn finish_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        avg_latency_ms: Option<i32>,
    ) -> Result<(), EngineError> {
        if self.finish_fails {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        self.close_run(run_id, |run| {
            run.status = JobRunStatus::Finished;
            run.records_generated = records_generated;
            run.avg_latency_ms = avg_latency_ms;
        });
        Ok(())
    }

    async fn fail_run(
        &self,
        run_id: DbId,
        records_generated: i64,
        error_message: &str,
    ) -> Result<(), EngineError> {
        self.close_run(run_id, |run| {
            run.status = JobRunStatus::Failed;
            run.records_generated = records_generated;
            run.error_message = Some(error_message.to_string());
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Generator that records every requested count.
///
/// By default it returns exactly the requested number of records, each with
/// every schema field set to `"<field>-<n>"` where `n` counts records across
/// calls.
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: Mutex<Vec<usize>>,
    produced: AtomicUsize,
    fail_on_call: Option<usize>,
    fixed_count: Option<usize>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call (1-based) and every call after it.
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Return `count` records per call regardless of the request.
    pub fn returning(mut self, count: usize) -> Self {
        self.fixed_count = Some(count);
        self
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requested counts, in call order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        schema: &SchemaDefinition,
        count: usize,
    ) -> Result<Vec<Record>, GeneratorError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(count);
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on_call.is_some_and(|n| call >= n) {
            return Err(GeneratorError::ProcessFailed {
                exit_code: 1,
                stderr: format!("scripted failure on call {call}"),
            });
        }

        let count = self.fixed_count.unwrap_or(count);
        let records: Vec<Record> = (0..count)
            .map(|_| {
                let n = self.produced.fetch_add(1, Ordering::SeqCst) + 1;
                schema
                    .field_names()
                    .map(|name| (name.to_string(), Value::String(format!("{name}-{n}"))))
                    .collect::<Record>()
            })
            .collect();
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisherFactory
// ---------------------------------------------------------------------------

type Published = Arc<Mutex<Vec<(String, Vec<Record>)>>>;

/// Publisher factory that keeps every published batch.
#[derive(Default)]
pub struct RecordingPublisherFactory {
    published: Published,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingPublisherFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishers that reject every batch, as if the bus were unreachable.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(topic, batch)` pairs in publish order.
    pub fn published(&self) -> Vec<(String, Vec<Record>)> {
        self.published.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PublisherFactory for RecordingPublisherFactory {
    fn open(&self) -> Box<dyn RecordPublisher> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingPublisher {
            published: Arc::clone(&self.published),
            closed: Arc::clone(&self.closed),
            fail: self.fail,
        })
    }
}

struct RecordingPublisher {
    published: Published,
    closed: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl RecordPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, records: &[Record]) -> Result<(), BusError> {
        if self.fail {
            return Err(BusError::Unavailable("scripted bus outage".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), records.to_vec()));
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingInserter
// ---------------------------------------------------------------------------

/// One `insert_batch` call seen by [`RecordingInserter`].
#[derive(Debug, Clone)]
pub struct InsertCall {
    pub dsn: String,
    pub table: String,
    pub rows: Vec<Record>,
}

#[derive(Default)]
pub struct RecordingInserter {
    calls: Mutex<Vec<InsertCall>>,
    fail_on_call: Option<usize>,
}

impl RecordingInserter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call (1-based).
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<InsertCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DestinationInserter for RecordingInserter {
    async fn insert_batch(
        &self,
        dsn: &str,
        table: &str,
        rows: &[Record],
    ) -> Result<(), InsertError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(InsertCall {
                dsn: dsn.to_string(),
                table: table.to_string(),
                rows: rows.to_vec(),
            });
            calls.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(InsertError::TableNotFound(table.to_string()));
        }
        Ok(())
    }
}
