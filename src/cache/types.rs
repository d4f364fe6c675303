use std::sync::Arc;

use serde::Serialize;

/// Point-in-time view of a [`TimedCache`](super::TimedCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries still inside their TTL.
    pub valid_entries: usize,
    /// Physically stored entries, expired or not.
    pub total_entries: usize,
    /// Stored but no longer observable.
    pub expired_entries: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheStats {
    /// Fraction of capacity held by valid entries.
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.valid_entries as f64 / self.capacity as f64
    }
}

/// What the fetch-stage cache holds. Keys are namespaced, so variants never collide.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCacheValue {
    /// Assembled context for a question (`context:` keys).
    Context(String),
    /// Question embedding (`embedding:` keys).
    Embedding(Arc<[f32]>),
    /// Memoized passage relevance (`relevance:` keys).
    Relevance(f32),
}
