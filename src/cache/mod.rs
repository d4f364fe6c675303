//! Time-bounded, capacity-bounded caches shared across concurrent queries.

pub mod sweeper;
pub mod timed;
pub mod types;


pub use sweeper::{CacheSweeper, Sweepable};
pub use timed::TimedCache;
pub use types::{CacheStats, ContextCacheValue};
