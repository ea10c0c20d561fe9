//! Atomic throughput and contention counters, materialized only when
//! [`crate::config::Config::enable_metrics`] is set.
//!
//! Updates sit off the CAS hot path: counters are bumped after a CAS loop
//! exits, not inside it, so enabling metrics does not change retry behavior
//! under contention.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    acquires_succeeded: AtomicU64,
    acquires_failed_lap: AtomicU64,
    acquires_failed_no_slots: AtomicU64,
    bytes_produced: AtomicU64,
    bytes_consumed: AtomicU64,
    wraps: AtomicU64,
    consume_spins: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_acquire_ok(&self, len: u32) {
        self.acquires_succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_produced.fetch_add(u64::from(len), Ordering::Relaxed);
    }

    pub(crate) fn record_acquire_fail_lap(&self) {
        self.acquires_failed_lap.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_acquire_fail_no_slots(&self) {
        self.acquires_failed_no_slots.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wrap(&self) {
        self.wraps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_consume_spin(&self) {
        self.consume_spins.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self, nbytes: u32) {
        self.bytes_consumed.fetch_add(u64::from(nbytes), Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            acquires_succeeded: self.acquires_succeeded.load(Ordering::Relaxed),
            acquires_failed_lap: self.acquires_failed_lap.load(Ordering::Relaxed),
            acquires_failed_no_slots: self.acquires_failed_no_slots.load(Ordering::Relaxed),
            bytes_produced: self.bytes_produced.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            wraps: self.wraps.load(Ordering::Relaxed),
            consume_spins: self.consume_spins.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`] suitable for logging/reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub acquires_succeeded: u64,
    pub acquires_failed_lap: u64,
    pub acquires_failed_no_slots: u64,
    pub bytes_produced: u64,
    pub bytes_consumed: u64,
    pub wraps: u64,
    pub consume_spins: u64,
}
