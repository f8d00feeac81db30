/// Errors from a generator invocation.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The generator executable could not be found.
    #[error("Generator executable not found: {0}")]
    NotFound(String),

    /// The generator exceeded its timeout and was killed.
    #[error("Generator timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The generator ran but exited unsuccessfully.
    #[error("Generator failed with exit code {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Stdout was not a JSON array of objects.
    #[error("Generator returned invalid output: {0}")]
    InvalidOutput(String),

    /// Spawning or talking to the process failed.
    #[error("Generator I/O error: {0}")]
    Io(#[from] std::io::Error),
}
