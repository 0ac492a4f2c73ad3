//! Injectable time source.
//!
//! `created_at` on persisted log entries, DLQ enrichment timestamps, and
//! cache expiry all need a clock that tests can control: a
//! `TimeProvider` trait with a real and a mock implementation, and a
//! `Time` newtype so nobody threads a bare `DateTime<Utc>` through the
//! crate and forgets which clock produced it.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A UTC instant, serialized as an ISO-8601 string everywhere it crosses
/// a wire or store boundary (§6 wire value format).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    pub fn duration_since(&self, earlier: Time) -> chrono::Duration {
        self.0 - earlier.0
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// Abstract source of "now", so that ingestion and cache-expiry logic
/// can be exercised deterministically in tests.
pub trait TimeProvider: Debug + Send + Sync + 'static {
    fn now(&self) -> Time;
}

/// Real wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider;

impl SystemProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        Time(Utc::now())
    }
}

/// A controllable clock for tests: starts at a fixed instant and only
/// advances when told to.
#[derive(Debug)]
pub struct MockProvider {
    now: Mutex<Time>,
}

impl MockProvider {
    pub fn new(start: Time) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: Time) {
        *self.now.lock() = t;
    }

    pub fn inc(&self, d: chrono::Duration) -> Time {
        let mut guard = self.now.lock();
        *guard = Time(guard.0 + d);
        *guard
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.lock()
    }
}

/// Convenience for call sites that just want a shared, type-erased clock.
pub type TimeProviderRef = Arc<dyn TimeProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_holds_still_until_advanced() {
        let t0 = Time::from_datetime(Utc::now());
        let mock = MockProvider::new(t0);
        assert_eq!(mock.now(), t0);
        assert_eq!(mock.now(), t0);

        let t1 = mock.inc(chrono::Duration::seconds(5));
        assert_eq!(mock.now(), t1);
        assert!(t1.duration_since(t0) == chrono::Duration::seconds(5));
    }
}
