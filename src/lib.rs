//! Dalgurak library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Engine
//! - [`QueryEngine`], [`BatchRunner`] - Gated, cached question answering
//! - [`QueryResult`], [`QuerySource`] - What every query returns
//! - [`EngineConfig`], [`Config`] - Engine and server configuration
//!
//! ## Building Blocks
//! - [`TimedCache`], [`CacheSweeper`] - Write-time TTL cache with FIFO eviction
//! - [`ConcurrencyGate`] - Concurrency bound plus start-to-start pacing
//! - [`QualityScorer`], [`QualityGate`] - Answer quality metrics and the cache-write gate
//!
//! ## Backends
//! - [`Retriever`], [`Embedder`], [`Generator`] - Collaborator traits
//! - [`CorpusRetriever`], [`HashEmbedder`], [`LlmGenerator`], [`TemplateGenerator`]
//!
//! ## Test/Mock Support
//! Mock backends are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod gate;
pub mod gateway;
pub mod hashing;
pub mod scoring;

pub use backend::{
    BackendError, BackendResult, CorpusRetriever, Embedder, Generation, Generator,
    HashEmbedder, LlmGenerator, Passage, Retriever, RetryPolicy, TemplateGenerator,
};
#[cfg(any(test, feature = "mock"))]
pub use backend::{MockEmbedder, MockGenerator, MockRetriever};
pub use cache::{CacheStats, CacheSweeper, ContextCacheValue, Sweepable, TimedCache};
pub use config::{Config, ConfigError};
pub use engine::{
    BatchRunner, EngineCacheStats, EngineConfig, PerformanceStats, QueryEngine, QueryError,
    QueryRequest, QueryResult, QuerySource,
};
pub use gate::{ConcurrencyGate, GateError, GateStats};
pub use hashing::{answer_key, context_key, embedding_key, fingerprint, normalize_question};
pub use scoring::{QualityGate, QualityMetrics, QualityScorer, Vocabulary, passage_relevance};
