//! Column-store sink
//!
//! Persists decoded rows keyed by id. Writes are idempotent: a replayed
//! row replaces the stored one instead of adding a duplicate.

mod engine;

pub use engine::{validate_identifier, DuckDbSink, RowSink, MEMORY_LOCATION};
