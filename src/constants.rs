//! Cross-cutting, shared constants.
//!
//! Engine defaults live here so that [`crate::config::Config`] and
//! [`crate::engine::EngineConfig`] agree without one importing the other.

use std::time::Duration;

/// Maximum number of pipeline bodies executing at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Admissions per second through the gate.
pub const DEFAULT_RATE_LIMIT: f64 = 10.0;

/// Entry bound applied independently to the answer cache and the context cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 5000;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 7200;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);

/// Passages scoring below this against the question are dropped from the context.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.3;

pub const DEFAULT_MIN_COMPLETENESS: f32 = 0.5;
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.5;

/// Passages requested from the retriever per question.
pub const DEFAULT_RETRIEVE_K: usize = 3;

/// Assembled context is truncated to this many characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 1500;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-16k";

pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GENERATION_RETRIES: usize = 2;

/// Output dimension of the hashing embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Largest batch accepted by the HTTP gateway.
pub const MAX_BATCH_SIZE: usize = 64;

/// Answer returned for an empty or whitespace-only question.
pub const EMPTY_QUESTION_ANSWER: &str = "질문을 입력해주세요.";

/// Answer returned when a query fails; the cause travels in the result's `error`.
pub const ERROR_ANSWER: &str = "죄송합니다. 응답 생성 중 오류가 발생했습니다.";
