//! Process-lifetime request counters and quality history.

use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::scoring::QualityMetrics;

/// Statistics for both engine caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub answer: CacheStats,
    pub context: CacheStats,
}

/// Aggregate view over every query the engine has seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_requests: u64,
    pub error_count: u64,
    /// `error_count / total_requests`.
    pub error_rate: f64,
    /// Answers served from the answer cache.
    pub cache_hits: u64,
    /// `cache_hits / total_requests`.
    pub cache_hit_rate: f64,
    /// Context or embedding lookups served from the fetch-stage cache.
    pub fetch_cache_hits: u64,
    /// Mean execution time of direct answers, in seconds.
    pub avg_execution_time: f64,
    pub avg_completeness: f64,
    pub avg_relevance: f64,
    pub avg_structure: f64,
}

#[derive(Debug, Default)]
pub(crate) struct MetricsAccumulator {
    request_count: u64,
    error_count: u64,
    cache_hits: u64,
    fetch_cache_hits: u64,
    execution_times: Vec<Duration>,
    quality_history: Vec<QualityMetrics>,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

impl MetricsAccumulator {
    pub fn record_request(&mut self) {
        self.request_count += 1;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_fetch_cache_hit(&mut self) {
        self.fetch_cache_hits += 1;
    }

    /// Records a direct answer.
    pub fn record_answer(&mut self, execution_time: Duration, quality: QualityMetrics) {
        self.execution_times.push(execution_time);
        self.quality_history.push(quality);
    }

    pub fn avg_execution_time(&self) -> f64 {
        mean(self.execution_times.iter().map(Duration::as_secs_f64))
    }

    pub fn cache_hit_rate(&self) -> f64 {
        ratio(self.cache_hits, self.request_count)
    }

    pub fn snapshot(&self) -> PerformanceStats {
        let history = &self.quality_history;
        PerformanceStats {
            total_requests: self.request_count,
            error_count: self.error_count,
            error_rate: ratio(self.error_count, self.request_count),
            cache_hits: self.cache_hits,
            cache_hit_rate: self.cache_hit_rate(),
            fetch_cache_hits: self.fetch_cache_hits,
            avg_execution_time: self.avg_execution_time(),
            avg_completeness: mean(history.iter().map(|q| f64::from(q.completeness))),
            avg_relevance: mean(history.iter().map(|q| f64::from(q.relevance))),
            avg_structure: mean(history.iter().map(|q| f64::from(q.structure))),
        }
    }
}
