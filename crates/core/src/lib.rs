//! Shared domain types for the synthetic data platform.
//!
//! Everything here is pure (no I/O) so the engine, the adapters and the API
//! can share it without pulling in a runtime.

pub mod chunking;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod settings;
pub mod types;
