use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{EMPTY_QUESTION_ANSWER, ERROR_ANSWER};
use crate::scoring::QualityMetrics;

/// A single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    /// Served from the answer cache without touching any backend.
    Cache,
    /// Produced by the full fetch, generate and score pipeline.
    Direct,
    /// The question was empty.
    Empty,
    /// The pipeline failed; see [`QueryResult::error`].
    Error,
}

impl QuerySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySource::Cache => "cache",
            QuerySource::Direct => "direct",
            QuerySource::Empty => "empty",
            QuerySource::Error => "error",
        }
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the answer cache stores per fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnswer {
    pub answer: String,
    pub quality: QualityMetrics,
    pub context_length: usize,
}

/// Outcome of one query. Every call produces one, failures included.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub answer: String,
    pub quality: QualityMetrics,
    /// Time spent after admission through the gate.
    pub execution_time: Duration,
    pub source: QuerySource,
    pub error: Option<String>,
    /// Characters of context the answer was generated from.
    pub context_length: usize,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
}

impl QueryResult {
    pub(crate) fn empty() -> Self {
        Self {
            answer: EMPTY_QUESTION_ANSWER.to_string(),
            quality: QualityMetrics::ZERO,
            execution_time: Duration::ZERO,
            source: QuerySource::Empty,
            error: None,
            context_length: 0,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn cached(entry: CachedAnswer, execution_time: Duration) -> Self {
        Self {
            answer: entry.answer,
            quality: entry.quality,
            execution_time,
            source: QuerySource::Cache,
            error: None,
            context_length: entry.context_length,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn direct(
        answer: String,
        quality: QualityMetrics,
        execution_time: Duration,
        context_length: usize,
    ) -> Self {
        Self {
            answer,
            quality,
            execution_time,
            source: QuerySource::Direct,
            error: None,
            context_length,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn failed(message: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            answer: ERROR_ANSWER.to_string(),
            quality: QualityMetrics::ZERO,
            execution_time,
            source: QuerySource::Error,
            error: Some(message.into()),
            context_length: 0,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.source == QuerySource::Error
    }

    /// True for `cache` and `direct` results.
    #[inline]
    pub fn is_answered(&self) -> bool {
        matches!(self.source, QuerySource::Cache | QuerySource::Direct)
    }
}
