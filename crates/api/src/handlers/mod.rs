pub mod connections;
pub mod jobs;
pub mod runs;
