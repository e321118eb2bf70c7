//! Pipeline counters.
//!
//! Plain atomics, bumped from the event sink and read as a point-in-time
//! [`MetricsSnapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    notifications: AtomicU64,
    failed_transactions: AtomicU64,
    events_decoded: AtomicU64,
    events_unrecognized: AtomicU64,
    decode_errors: AtomicU64,
    duplicates: AtomicU64,
    store_errors: AtomicU64,
    webhook_deliveries: AtomicU64,
    webhook_failures: AtomicU64,
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub notifications: u64,
    pub failed_transactions: u64,
    pub events_decoded: u64,
    pub events_unrecognized: u64,
    pub decode_errors: u64,
    /// Events whose signature was already stored
    pub duplicates: u64,
    pub store_errors: u64,
    pub webhook_deliveries: u64,
    pub webhook_failures: u64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_notification(&self, failed: bool, unrecognized: usize, decode_errors: usize) {
        bump(&self.notifications, 1);
        if failed {
            bump(&self.failed_transactions, 1);
        }
        bump(&self.events_unrecognized, unrecognized as u64);
        bump(&self.decode_errors, decode_errors as u64);
    }

    pub fn record_decoded(&self) {
        bump(&self.events_decoded, 1);
    }

    pub fn record_duplicate(&self) {
        bump(&self.duplicates, 1);
    }

    pub fn record_store_error(&self) {
        bump(&self.store_errors, 1);
    }

    pub fn record_dispatch(&self, delivered: usize, failed: usize) {
        bump(&self.webhook_deliveries, delivered as u64);
        bump(&self.webhook_failures, failed as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            notifications: get(&self.notifications),
            failed_transactions: get(&self.failed_transactions),
            events_decoded: get(&self.events_decoded),
            events_unrecognized: get(&self.events_unrecognized),
            decode_errors: get(&self.decode_errors),
            duplicates: get(&self.duplicates),
            store_errors: get(&self.store_errors),
            webhook_deliveries: get(&self.webhook_deliveries),
            webhook_failures: get(&self.webhook_failures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let m = PipelineMetrics::new();
        m.record_notification(false, 2, 1);
        m.record_notification(true, 0, 0);
        m.record_decoded();
        m.record_duplicate();
        m.record_dispatch(3, 1);

        let s = m.snapshot();
        assert_eq!(s.notifications, 2);
        assert_eq!(s.failed_transactions, 1);
        assert_eq!(s.events_unrecognized, 2);
        assert_eq!(s.decode_errors, 1);
        assert_eq!(s.events_decoded, 1);
        assert_eq!(s.duplicates, 1);
        assert_eq!(s.webhook_deliveries, 3);
        assert_eq!(s.webhook_failures, 1);
        assert_eq!(s.store_errors, 0);
    }
}
