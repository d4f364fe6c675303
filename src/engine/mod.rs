//! Concurrency-controlled query engine.
//!
//! [`QueryEngine`] runs each question through the pipeline
//!
//! ```text
//! CacheCheck -> Fetch (context || embedding) -> Generate -> Score -> CacheWrite? -> Done
//! ```
//!
//! inside a [`ConcurrencyGate`](crate::gate::ConcurrencyGate). A hit in the answer
//! cache ends the pipeline before any backend is called. Generated answers are
//! written back only when they clear the [`QualityGate`](crate::scoring::QualityGate).
//! Any failure along the way becomes a `source = error` result; nothing propagates
//! to the caller. [`BatchRunner`] fans a list of questions out over the same engine.

pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod types;

#[cfg(test)]
mod tests;

pub use batch::BatchRunner;
pub use config::EngineConfig;
pub use error::{QueryError, QueryOutcome};
pub use metrics::{EngineCacheStats, PerformanceStats};
pub use orchestrator::QueryEngine;
pub use types::{CachedAnswer, QueryRequest, QueryResult, QuerySource};
