//! Job execution and streaming engines.
//!
//! [`JobExecutor`] turns one job into a bounded run of
//! generate → publish → transform → insert chunks and records the run's
//! outcome. [`StreamEngine`] runs an unbounded, cancellable one-record-at-a-
//! time generation loop for live previews. Both reach the outside world only
//! through injected traits: [`JobStore`], `RecordGenerator`,
//! `PublisherFactory` and `DestinationInserter`.

pub mod context;
pub mod error;
pub mod executor;
pub mod lease;
pub mod store;
pub mod stream;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::JobContext;
pub use error::EngineError;
pub use executor::{JobExecutor, RunResult, RUN_SUCCESS_STATUS};
pub use lease::{ActiveRuns, RunLease};
pub use store::{JobStore, PgJobStore};
pub use stream::{StreamEngine, StreamSession, StreamState};
