//! Record generator adapter.
//!
//! The engine treats record generation as an opaque call: a schema and a
//! count go in, a batch of JSON objects (or a classified failure) comes out.
//! [`RecordGenerator`] is that seam; [`SubprocessGenerator`] is the
//! production implementation that shells out to an external program.

pub mod error;
pub mod subprocess;

use async_trait::async_trait;
use synth_core::schema::SchemaDefinition;
use synth_core::types::Record;

pub use error::GeneratorError;
pub use subprocess::{GeneratorConfig, SubprocessGenerator};

/// Produces synthetic records conforming to a schema.
#[async_trait]
pub trait RecordGenerator: Send + Sync {
    /// Generate `count` records for `schema`.
    ///
    /// Implementations may return fewer or more records than requested; the
    /// caller decides how to account for the difference.
    async fn generate(
        &self,
        schema: &SchemaDefinition,
        count: usize,
    ) -> Result<Vec<Record>, GeneratorError>;
}
