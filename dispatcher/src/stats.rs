use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters updated by the workers.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    handled: AtomicU64,
    failures: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
}

/// Point-in-time copy of [`DispatcherStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Requests taken off the queue and passed to the handler.
    pub handled: u64,
    /// Handler passes that ended in an error or a panic.
    pub failures: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
}

impl DispatcherStats {
    pub fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            handled: self.handled.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}
