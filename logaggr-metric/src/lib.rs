//! Process-global counters and timers.
//!
//! A small `Registry` hands out cheaply-clonable, atomically-updated
//! instruments keyed by name. No external metrics backend is wired up
//! here — exporting these to Prometheus/StatsD/whatever is a
//! deployment concern outside this crate's scope; it stays
//! backend-agnostic and lets a separate exporter do the translation.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;

/// A monotonically increasing counter.
#[derive(Debug, Clone, Default)]
pub struct U64Counter(Arc<AtomicU64>);

impl U64Counter {
    pub fn inc(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Running count + total duration, reported as (count, mean, total).
#[derive(Debug, Default)]
struct DurationStats {
    count: AtomicU64,
    total_nanos: AtomicU64,
}

/// A timer/histogram simplified to count + total (sufficient for the
/// spec's `api.logs.ingest.duration` / `consumer.batch.processing.duration`
/// timers, which are only ever reported as elapsed wall time).
#[derive(Debug, Clone, Default)]
pub struct DurationTimer(Arc<DurationStats>);

impl DurationTimer {
    pub fn record(&self, elapsed: Duration) {
        self.0.count.fetch_add(1, Ordering::Relaxed);
        self.0
            .total_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.0.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.0.total_nanos.load(Ordering::Relaxed) / count)
    }
}

/// Process-wide registry of named instruments.
///
/// `Registry` is cheap to clone (it's an `Arc` underneath) and is
/// expected to be constructed once at startup and threaded through
/// every component that needs to record a metric.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    counters: HashMap<&'static str, U64Counter>,
    timers: HashMap<&'static str, DurationTimer>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named counter, creating it on first access.
    pub fn counter(&self, name: &'static str) -> U64Counter {
        self.inner
            .lock()
            .counters
            .entry(name)
            .or_insert_with(U64Counter::default)
            .clone()
    }

    /// Returns the named timer, creating it on first access.
    pub fn timer(&self, name: &'static str) -> DurationTimer {
        self.inner
            .lock()
            .timers
            .entry(name)
            .or_insert_with(DurationTimer::default)
            .clone()
    }

    /// Snapshot of every counter currently registered, for the admin
    /// metrics endpoint (§4.10 / §6).
    pub fn counter_snapshot(&self) -> HashMap<&'static str, u64> {
        self.inner
            .lock()
            .counters
            .iter()
            .map(|(k, v)| (*k, v.get()))
            .collect()
    }
}

/// Names of the counters/timers §4.10 defines. Kept as constants so
/// call sites can't typo a metric name into a second, silently-divergent
/// series.
pub mod names {
    pub const LOGS_PUBLISHED_TOTAL: &str = "logs.published.total";
    pub const LOGS_CONSUMED_TOTAL: &str = "logs.consumed.total";
    pub const LOGS_DLQ_TOTAL: &str = "logs.dlq.total";
    pub const API_LOGS_INGEST_DURATION: &str = "api.logs.ingest.duration";
    pub const CONSUMER_BATCH_PROCESSING_DURATION: &str = "consumer.batch.processing.duration";
}
