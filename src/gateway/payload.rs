use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::engine::{EngineCacheStats, PerformanceStats, QueryResult, QuerySource};
use crate::gate::GateStats;
use crate::scoring::QualityMetrics;

/// Wire form of a [`QueryResult`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AskResponse {
    pub answer: String,
    pub quality: QualityMetrics,
    /// Seconds.
    pub execution_time: f64,
    pub source: QuerySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub context_length: usize,
    pub timestamp: DateTime<Utc>,
}

impl From<QueryResult> for AskResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            quality: result.quality,
            execution_time: result.execution_time.as_secs_f64(),
            source: result.source,
            error: result.error,
            context_length: result.context_length,
            timestamp: result.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BatchRequest {
    pub questions: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BatchResponse {
    pub results: Vec<AskResponse>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatsResponse {
    pub performance: PerformanceStats,
    pub answer_cache: CacheStats,
    pub context_cache: CacheStats,
    pub gate: GateStats,
}

impl StatsResponse {
    pub fn new(performance: PerformanceStats, caches: EngineCacheStats, gate: GateStats) -> Self {
        Self {
            performance,
            answer_cache: caches.answer,
            context_cache: caches.context,
            gate,
        }
    }
}
