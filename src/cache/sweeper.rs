//! Periodic removal of expired entries.
//!
//! Reads already hide expired entries, so the sweeper only bounds memory held by
//! entries nobody asks for again. It never changes what a reader can observe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use super::TimedCache;

/// Anything the sweeper can purge.
pub trait Sweepable: Send + Sync {
    /// Removes expired entries and returns how many were dropped.
    fn sweep(&self) -> usize;
}

impl<V: Clone + Send> Sweepable for TimedCache<V> {
    fn sweep(&self) -> usize {
        self.cleanup_expired()
    }
}

/// Background task that sweeps a fixed set of caches on an interval.
///
/// Each started loop owns its own run flag, so a loop stopped before its next tick
/// never keeps running alongside a restarted one.
pub struct CacheSweeper {
    targets: Vec<(&'static str, Arc<dyn Sweepable>)>,
    interval: Duration,
    current_run: Mutex<Option<Arc<AtomicBool>>>,
}

impl CacheSweeper {
    pub fn new(interval: Duration) -> Self {
        Self {
            targets: Vec::new(),
            interval,
            current_run: Mutex::new(None),
        }
    }

    /// Adds a cache under a label used in log output.
    pub fn with_target(mut self, label: &'static str, cache: Arc<dyn Sweepable>) -> Self {
        self.targets.push((label, cache));
        self
    }

    /// Sweeps every target once and returns the total removed.
    pub fn sweep_once(&self) -> usize {
        sweep_all(&self.targets)
    }

    pub fn is_running(&self) -> bool {
        self.current_run
            .lock()
            .as_ref()
            .is_some_and(|run| run.load(Ordering::Acquire))
    }

    /// Starts the sweep loop. A second call while running is a no-op.
    pub fn start(&self) -> JoinHandle<()> {
        if self.interval.is_zero() {
            return tokio::spawn(async {});
        }

        let running = {
            let mut current = self.current_run.lock();
            if current
                .as_ref()
                .is_some_and(|run| run.load(Ordering::Acquire))
            {
                return tokio::spawn(async {});
            }
            let run = Arc::new(AtomicBool::new(true));
            *current = Some(Arc::clone(&run));
            run
        };

        let targets = self.targets.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick completes immediately; nothing can be expired yet.
            ticker.tick().await;
            while running.load(Ordering::Acquire) {
                ticker.tick().await;
                if !running.load(Ordering::Acquire) {
                    break;
                }
                sweep_all(&targets);
            }
        })
    }

    /// Asks the current loop to exit at its next tick.
    pub fn stop(&self) {
        if let Some(run) = self.current_run.lock().take() {
            run.store(false, Ordering::Release);
        }
    }
}

fn sweep_all(targets: &[(&'static str, Arc<dyn Sweepable>)]) -> usize {
    targets
        .iter()
        .map(|(label, cache)| {
            let removed = cache.sweep();
            if removed > 0 {
                debug!(cache = *label, removed, "Swept expired cache entries");
            }
            removed
        })
        .sum()
}

impl std::fmt::Debug for CacheSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSweeper")
            .field(
                "targets",
                &self.targets.iter().map(|(l, _)| *l).collect::<Vec<_>>(),
            )
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
