use std::time::Duration;

use crate::config::Config;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_CONTEXT_CHARS,
    DEFAULT_RATE_LIMIT, DEFAULT_RELEVANCE_THRESHOLD, DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::scoring::QualityGate;

/// Knobs the query engine reads at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Gate width.
    pub max_concurrent: usize,
    /// Admissions per second.
    pub rate_limit: f64,
    /// Applied to the answer cache and the context cache independently.
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Passages below this relevance are left out of the context.
    pub relevance_threshold: f32,
    /// Minimum quality an answer needs to be cached.
    pub quality_gate: QualityGate,
    pub max_context_chars: usize,
    /// Period of the background expiry sweep. Zero disables it.
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            rate_limit: DEFAULT_RATE_LIMIT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            quality_gate: QualityGate::default(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl EngineConfig {
    /// Sets gate width and pacing.
    pub fn gate(mut self, max_concurrent: usize, rate_limit: f64) -> Self {
        self.max_concurrent = max_concurrent;
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the bound and TTL shared by both caches.
    pub fn cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    pub fn relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn quality_gate(mut self, gate: QualityGate) -> Self {
        self.quality_gate = gate;
        self
    }

    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.max_context_chars = chars;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            rate_limit: config.rate_limit,
            cache_capacity: config.cache_capacity,
            cache_ttl: config.cache_ttl,
            relevance_threshold: config.relevance_threshold,
            quality_gate: config.quality_gate,
            max_context_chars: config.max_context_chars,
            sweep_interval: config.sweep_interval,
        }
    }
}
