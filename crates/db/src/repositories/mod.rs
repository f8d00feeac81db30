//! Repository structs, one per table. All methods are associated functions
//! taking the pool explicitly.

mod connection_repo;
mod job_mapping_repo;
mod job_repo;
mod job_run_repo;
mod schema_repo;

pub use connection_repo::ConnectionRepo;
pub use job_mapping_repo::JobMappingRepo;
pub use job_repo::JobRepo;
pub use job_run_repo::JobRunRepo;
pub use schema_repo::SchemaRepo;
