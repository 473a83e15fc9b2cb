//! Metrics collection for universe selection

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Snapshot of selection counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMetrics {
    /// Selection cycles started
    pub cycles: u64,

    /// Cycles that ended in an error
    pub failed_cycles: u64,

    /// Candidates returned by the selector across all cycles
    pub candidates_seen: u64,

    /// Candidates that mapped to an already selected chain in the same cycle
    pub duplicates_dropped: u64,

    /// Chain universes produced
    pub universes_emitted: u64,

    /// Chain securities created
    pub securities_created: u64,

    /// Chain securities found in the registry and reused
    pub securities_reused: u64,

    /// Duration of the last cycle in nanoseconds
    pub last_cycle_duration_ns: u64,
}

/// Lock-free counters updated by the selection model
#[derive(Debug, Default)]
pub struct MetricsCollector {
    cycles: AtomicU64,
    failed_cycles: AtomicU64,
    candidates_seen: AtomicU64,
    duplicates_dropped: AtomicU64,
    universes_emitted: AtomicU64,
    securities_created: AtomicU64,
    securities_reused: AtomicU64,
    last_cycle_duration_ns: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_started(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_failed(&self) {
        self.failed_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_candidates(&self, count: usize) {
        self.candidates_seen.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_duplicates(&self, count: usize) {
        self.duplicates_dropped.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_security(&self, created: bool) {
        if created {
            self.securities_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.securities_reused.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cycle_completed(&self, universes: usize, duration: Duration) {
        self.universes_emitted.fetch_add(universes as u64, Ordering::Relaxed);
        self.last_cycle_duration_ns.store(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> SelectionMetrics {
        SelectionMetrics {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            candidates_seen: self.candidates_seen.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            universes_emitted: self.universes_emitted.load(Ordering::Relaxed),
            securities_created: self.securities_created.load(Ordering::Relaxed),
            securities_reused: self.securities_reused.load(Ordering::Relaxed),
            last_cycle_duration_ns: self.last_cycle_duration_ns.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.cycles,
            &self.failed_cycles,
            &self.candidates_seen,
            &self.duplicates_dropped,
            &self.universes_emitted,
            &self.securities_created,
            &self.securities_reused,
            &self.last_cycle_duration_ns,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
