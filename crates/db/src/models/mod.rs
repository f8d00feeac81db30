pub mod connection;
pub mod job;
pub mod job_mapping;
pub mod job_run;
pub mod schema;
pub mod status;
