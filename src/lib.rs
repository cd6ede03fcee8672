// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # userflow
//!
//! Scheduled ingestion of synthetic "random user" records: an HTTP API is
//! polled on a cadence, each user is flattened and published to a Kafka
//! topic, and a long-running subscription decodes the topic into a DuckDB
//! table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use userflow::broker::{MemoryBroker, Publisher, DEFAULT_TOPIC};
//! use userflow::http::HttpClient;
//! use userflow::pipeline::produce_once;
//! use userflow::source::{RandomUserSource, DEFAULT_SOURCE_URL};
//!
//! #[tokio::main]
//! async fn main() -> userflow::Result<()> {
//!     let source = RandomUserSource::new(HttpClient::new()?, DEFAULT_SOURCE_URL);
//!     let broker = MemoryBroker::new();
//!     let publisher = Publisher::new(Arc::new(broker.clone()), DEFAULT_TOPIC);
//!
//!     let record = produce_once(&source, &publisher).await?;
//!     println!("published {}", record.username);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  scheduled tick ──► source ──► record::normalize ──► broker::Publisher ──► [users_created]
//!                                                                               │
//!  sink::DuckDbSink ◄── record::decode (+ id) ◄── broker::MessageSource ◄───────┘
//!         ▲                       │
//!         └── state::CheckpointStore   broker::DeadLetterSink (rejects)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pipeline configuration
pub mod config;

/// HTTP client for the upstream API
pub mod http;

/// Upstream user fetcher
pub mod source;

/// Record shapes, normalization and decoding
pub mod record;

/// Broker clients, in-memory broker and dead letters
pub mod broker;

/// Subscription checkpointing
pub mod state;

/// Column-store sink (DuckDB)
pub mod sink;

/// Producer task and subscription loop
pub mod pipeline;

/// Cadence and tick loop for the producer
pub mod schedule;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use record::{NormalizedUserRecord, PersistedUserRow, RawUserRecord};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
