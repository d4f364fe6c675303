//! Admission control for query pipelines.
//!
//! [`ConcurrencyGate`] bounds how many protected blocks execute at once and spaces
//! consecutive admissions at least `1 / rate_limit` apart, measured start to start.
//! Completion time plays no part: slow calls can overlap, so completed throughput may
//! exceed the nominal rate.
//!
//! The last start time is shared by every admitted run. Each run reserves its start
//! instant under a short mutex (`max(now, last_start + spacing)`), then sleeps outside
//! the lock until that instant, so concurrent admissions never read a stale value.

pub mod error;


pub use error::GateError;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct RateState {
    last_start: Option<Instant>,
}

/// Snapshot of gate activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateStats {
    /// Runs admitted since construction.
    pub admitted: u64,
    /// Runs currently holding a slot (including those waiting out the pacing delay).
    pub in_flight: usize,
    pub max_concurrent: usize,
    pub rate_limit: f64,
    /// Milliseconds since the most recent admission, if any.
    pub last_start_age_ms: Option<u64>,
}

/// Concurrency bound plus start-to-start pacing.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    rate_limit: f64,
    min_spacing: Duration,
    rate_state: Mutex<RateState>,
    admitted: AtomicU64,
}

impl ConcurrencyGate {
    /// Creates a gate admitting `max_concurrent` runs at `rate_limit` starts per second.
    ///
    /// A zero width is raised to one. A non-finite or non-positive rate disables pacing.
    /// A rate so small that its spacing overflows [`Duration`] paces at [`Duration::MAX`].
    pub fn new(max_concurrent: usize, rate_limit: f64) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let min_spacing = if rate_limit.is_finite() && rate_limit > 0.0 {
            spacing_for(rate_limit).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            rate_limit,
            min_spacing,
            rate_state: Mutex::new(RateState::default()),
            admitted: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    #[inline]
    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    /// Minimum start-to-start spacing between admissions.
    #[inline]
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Waits for a slot, waits out the pacing delay, then runs `f`.
    ///
    /// The slot is released when `f` completes, fails, panics or is dropped.
    pub async fn run<F, Fut, T>(&self, f: F) -> Result<T, GateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GateError::Closed)?;

        let start_at = self.reserve_start();
        let now = Instant::now();
        if start_at > now {
            trace!(delay_ms = (start_at - now).as_millis() as u64, "Pacing admission");
            tokio::time::sleep_until(start_at).await;
        }

        self.admitted.fetch_add(1, Ordering::Relaxed);
        Ok(f().await)
    }

    fn reserve_start(&self) -> Instant {
        let now = Instant::now();
        let mut state = self.rate_state.lock();
        let start = match state.last_start {
            Some(last) => last
                .checked_add(self.min_spacing)
                .unwrap_or_else(far_future)
                .max(now),
            None => now,
        };
        state.last_start = Some(start);
        start
    }

    /// Rejects all pending and future admissions. Runs already admitted finish normally.
    pub fn close(&self) {
        if !self.semaphore.is_closed() {
            debug!("Closing concurrency gate");
            self.semaphore.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Runs currently holding a slot.
    pub fn in_flight(&self) -> usize {
        if self.semaphore.is_closed() {
            return 0;
        }
        self.max_concurrent
            .saturating_sub(self.semaphore.available_permits())
    }

    pub fn stats(&self) -> GateStats {
        let last_start = self.rate_state.lock().last_start;
        GateStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
            max_concurrent: self.max_concurrent,
            rate_limit: self.rate_limit,
            last_start_age_ms: last_start
                .map(|at| Instant::now().saturating_duration_since(at).as_millis() as u64),
        }
    }
}

/// Start-to-start spacing for `rate_limit` admissions per second.
///
/// `None` when the spacing is not representable as a [`Duration`].
pub fn spacing_for(rate_limit: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / rate_limit).ok()
}

/// Stand-in for "never" when the next start would overflow [`Instant`].
fn far_future() -> Instant {
    // ~30 years
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

impl std::fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("max_concurrent", &self.max_concurrent)
            .field("rate_limit", &self.rate_limit)
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}
