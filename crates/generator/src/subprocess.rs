//! Subprocess-backed generator.
//!
//! Runs `<program> [args...] '<schema_json>' <count>`, where `schema_json`
//! is `{"fields": [...]}`, and expects stdout to be a JSON array of objects.
//! The child is killed when the call times out or its future is dropped.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use synth_core::schema::SchemaDefinition;
use synth_core::types::Record;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::{GeneratorError, RecordGenerator};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Stdout past this limit is [`GeneratorError::InvalidOutput`] whatever the
/// exit status. Stderr is truncated.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default wall-clock limit for a single generator call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How to launch the external generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Executable to run, resolved through `PATH`.
    pub program: String,
    /// Arguments placed before the schema and count.
    pub args: Vec<String>,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["synthesizer.py".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`RecordGenerator`] that spawns one process per call.
#[derive(Debug, Clone)]
pub struct SubprocessGenerator {
    config: GeneratorConfig,
}

impl SubprocessGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[async_trait]
impl RecordGenerator for SubprocessGenerator {
    async fn generate(
        &self,
        schema: &SchemaDefinition,
        count: usize,
    ) -> Result<Vec<Record>, GeneratorError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let schema_json = serde_json::to_string(schema).map_err(std::io::Error::from)?;

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(schema_json)
            .arg(count.to_string());

        let start = Instant::now();
        let stdout = run_command(&mut cmd, &self.config.program, self.config.timeout).await?;
        let records = parse_records(&stdout)?;

        tracing::debug!(
            program = %self.config.program,
            requested = count,
            returned = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generator call finished",
        );

        Ok(records)
    }
}

/// Spawn `cmd`, capture its output and enforce `timeout`.
///
/// The timeout covers the process exit and both pipes reaching EOF, so a
/// background child that keeps stdout open still times out. Returns stdout
/// on a zero exit status.
async fn run_command(
    cmd: &mut Command,
    program: &str,
    timeout: Duration,
) -> Result<Vec<u8>, GeneratorError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GeneratorError::NotFound(program.to_string()),
        _ => GeneratorError::Io(e),
    })?;

    // Read both pipes in their own tasks so `child.wait()` can borrow the child.
    let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let finished = tokio::time::timeout(timeout, async {
        let status = child.wait().await?;
        let stdout = (&mut stdout_task).await.unwrap_or_default();
        let stderr = (&mut stderr_task).await.unwrap_or_default();
        Ok::<_, std::io::Error>((status, stdout, stderr))
    })
    .await;

    match finished {
        Ok(Ok((status, stdout, mut stderr))) => {
            if stdout.len() > MAX_OUTPUT_BYTES {
                return Err(GeneratorError::InvalidOutput(
                    "generator output exceeds 10 MiB".to_string(),
                ));
            }

            if status.success() {
                Ok(stdout)
            } else {
                stderr.truncate(MAX_OUTPUT_BYTES);
                Err(GeneratorError::ProcessFailed {
                    exit_code: status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(GeneratorError::Io(e))
        }
        Err(_elapsed) => {
            // `child` is dropped on return, which kills it (`kill_on_drop`).
            // Aborting the readers closes the pipes left open by any
            // background process it spawned.
            stdout_task.abort();
            stderr_task.abort();
            Err(GeneratorError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

/// Read an entire output stream, stopping one byte past [`MAX_OUTPUT_BYTES`]
/// so the caller can tell an oversized stream from one exactly at the limit.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64 + 1)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

/// Parse generator stdout as a JSON array of objects.
fn parse_records(stdout: &[u8]) -> Result<Vec<Record>, GeneratorError> {
    let values: Vec<Value> = serde_json::from_slice(stdout)
        .map_err(|e| GeneratorError::InvalidOutput(format!("expected a JSON array: {e}")))?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(record) => Ok(record),
            other => Err(GeneratorError::InvalidOutput(format!(
                "element {i} is not an object: {other}"
            ))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
