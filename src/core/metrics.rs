//! Router metrics for observability
//!
//! Counters describing what the dispatch thread has done. They are updated
//! with relaxed atomics and read by status snapshots and by callers holding a
//! router handle.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for router health
///
/// # Example
///
/// ```
/// use rust_log_router::RouterMetrics;
///
/// let metrics = RouterMetrics::new();
/// metrics.record_accepted();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.accepted(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct RouterMetrics {
    /// Entries accepted into the inbound queue
    accepted: AtomicU64,

    /// Successful backend writes (one entry to one backend)
    delivered: AtomicU64,

    /// Backend writes that returned an error or panicked
    failed_writes: AtomicU64,

    /// Backends retired after a failed write
    backends_removed: AtomicU64,

    /// Calls refused because the router was closed
    rejected_after_close: AtomicU64,
}

impl RouterMetrics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
            backends_removed: AtomicU64::new(0),
            rejected_after_close: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backends_removed(&self) -> u64 {
        self.backends_removed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_after_close(&self) -> u64 {
        self.rejected_after_close.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed_write(&self) -> u64 {
        self.failed_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backend_removed(&self) -> u64 {
        self.backends_removed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected_after_close.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed writes as a percentage of all writes (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_writes() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for RouterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RouterMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.accepted()),
            delivered: AtomicU64::new(self.delivered()),
            failed_writes: AtomicU64::new(self.failed_writes()),
            backends_removed: AtomicU64::new(self.backends_removed()),
            rejected_after_close: AtomicU64::new(self.rejected_after_close()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = RouterMetrics::new();
        assert_eq!(metrics.accepted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.failed_writes(), 0);
        assert_eq!(metrics.backends_removed(), 0);
        assert_eq!(metrics.rejected_after_close(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = RouterMetrics::new();
        assert_eq!(metrics.record_failed_write(), 0);
        assert_eq!(metrics.record_failed_write(), 1);
        assert_eq!(metrics.failed_writes(), 2);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = RouterMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_delivered();
        }
        for _ in 0..10 {
            metrics.record_failed_write();
        }
        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = RouterMetrics::new();
        metrics.record_delivered();

        let snapshot = metrics.clone();
        metrics.record_delivered();

        assert_eq!(snapshot.delivered(), 1);
        assert_eq!(metrics.delivered(), 2);
    }
}
