use std::str::FromStr;
use std::time::Duration;

use synth_bus::KafkaConfig;
use synth_generator::GeneratorConfig;
use synth_pipeline::stream::DEFAULT_STREAM_BUFFER;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Batch runs execute
    /// inside the request, so this bounds the largest practical run.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".into()),
            ',',
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Which bus generated records are published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusBackend {
    Kafka,
    /// In-process broadcast; records never leave the server.
    Memory,
}

impl FromStr for BusBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kafka" => Ok(Self::Kafka),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown bus backend '{other}' (expected kafka or memory)")),
        }
    }
}

/// Engine collaborators' configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub generator: GeneratorConfig,
    pub bus: BusBackend,
    pub kafka: KafkaConfig,
    /// Records buffered per streaming session.
    pub stream_buffer: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default          |
    /// |----------------------------|------------------|
    /// | `GENERATOR_PROGRAM`        | `python`         |
    /// | `GENERATOR_ARGS`           | `synthesizer.py` |
    /// | `GENERATOR_TIMEOUT_SECS`   | `120`            |
    /// | `BUS_BACKEND`              | `kafka`          |
    /// | `KAFKA_BOOTSTRAP_SERVERS`  | `localhost:9092` |
    /// | `KAFKA_FLUSH_TIMEOUT_SECS` | `10`             |
    /// | `STREAM_BUFFER`            | `16`             |
    ///
    /// `GENERATOR_ARGS` is split on whitespace.
    pub fn from_env() -> Self {
        let defaults = GeneratorConfig::default();

        let program = std::env::var("GENERATOR_PROGRAM").unwrap_or(defaults.program);
        let args = std::env::var("GENERATOR_ARGS")
            .map(|v| parse_list(&v, ' '))
            .unwrap_or(defaults.args);
        let generator_timeout_secs: u64 = std::env::var("GENERATOR_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout.as_secs().to_string())
            .parse()
            .expect("GENERATOR_TIMEOUT_SECS must be a valid u64");

        let bus: BusBackend = std::env::var("BUS_BACKEND")
            .unwrap_or_else(|_| "kafka".into())
            .parse()
            .unwrap_or_else(|e| panic!("Invalid BUS_BACKEND: {e}"));

        let kafka_defaults = KafkaConfig::default();
        let bootstrap_servers = std::env::var("KAFKA_BOOTSTRAP_SERVERS")
            .unwrap_or(kafka_defaults.bootstrap_servers);
        let flush_timeout_secs: u64 = std::env::var("KAFKA_FLUSH_TIMEOUT_SECS")
            .unwrap_or_else(|_| kafka_defaults.flush_timeout.as_secs().to_string())
            .parse()
            .expect("KAFKA_FLUSH_TIMEOUT_SECS must be a valid u64");

        let stream_buffer: usize = std::env::var("STREAM_BUFFER")
            .unwrap_or_else(|_| DEFAULT_STREAM_BUFFER.to_string())
            .parse()
            .expect("STREAM_BUFFER must be a valid usize");

        Self {
            generator: GeneratorConfig {
                program,
                args,
                timeout: Duration::from_secs(generator_timeout_secs),
            },
            bus,
            kafka: KafkaConfig {
                bootstrap_servers,
                flush_timeout: Duration::from_secs(flush_timeout_secs),
                ..kafka_defaults
            },
            stream_buffer,
        }
    }
}

fn parse_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
