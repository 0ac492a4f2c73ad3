//! In-memory [`RelationalStore`] for tests that don't need a live
//! Postgres instance — the ingest/consumer test suites exercise the
//! DLQ-routing and pairing behavior against this rather than spinning
//! up a database.

use async_trait::async_trait;
use parking_lot::Mutex;

use logaggr_time::TimeProviderRef;
use logaggr_types::{LogEntry, LogEntryRequest};

use crate::{matches, paginate, CatalogError, RelationalCriteria, RelationalStore};

#[derive(Debug)]
pub struct InMemoryRelationalStore {
    clock: TimeProviderRef,
    entries: Mutex<Vec<LogEntry>>,
    next_id: Mutex<i64>,
    fail_next: Mutex<usize>,
}

impl InMemoryRelationalStore {
    pub fn new(clock: TimeProviderRef) -> Self {
        Self {
            clock,
            entries: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            fail_next: Mutex::new(0),
        }
    }

    /// Makes the next `n` insert attempts (each request within a
    /// `save`/`save_all` call counts as one attempt) fail, to exercise
    /// DLQ routing in consumer tests.
    pub fn fail_next(&self, n: usize) {
        *self.fail_next.lock() = n;
    }

    fn try_consume_failure(&self) -> bool {
        let mut remaining = self.fail_next.lock();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    pub fn all(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl RelationalStore for InMemoryRelationalStore {
    async fn save(&self, request: &LogEntryRequest) -> Result<LogEntry, CatalogError> {
        if self.try_consume_failure() {
            return Err(CatalogError::Query {
                source: sqlx::Error::RowNotFound,
            });
        }
        let id = {
            let mut next_id = self.next_id.lock();
            let id = *next_id;
            *next_id += 1;
            id
        };
        let entry = LogEntry::from_request(request, id, self.clock.now());
        self.entries.lock().push(entry.clone());
        Ok(entry)
    }

    async fn save_all(&self, requests: &[LogEntryRequest]) -> Result<Vec<LogEntry>, CatalogError> {
        let mut saved = Vec::with_capacity(requests.len());
        for request in requests {
            saved.push(self.save(request).await?);
        }
        Ok(saved)
    }

    async fn find_page(
        &self,
        criteria: &RelationalCriteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogEntry>, u64), CatalogError> {
        let filtered: Vec<LogEntry> = self
            .entries
            .lock()
            .iter()
            .filter(|e| matches(criteria, e))
            .cloned()
            .collect();
        Ok(paginate(filtered, page, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaggr_time::{SystemProvider, TimeProvider};
    use logaggr_types::LogLevel;
    use std::sync::Arc;

    fn request(service_id: &str) -> LogEntryRequest {
        LogEntryRequest {
            timestamp: SystemProvider::new().now(),
            service_id: service_id.into(),
            level: LogLevel::Info,
            message: "hello".into(),
            metadata: None,
            trace_id: None,
        }
    }

    #[tokio::test]
    async fn save_all_assigns_ids_in_input_order() {
        let store = InMemoryRelationalStore::new(Arc::new(SystemProvider::new()));
        let requests = vec![request("a"), request("b"), request("c")];
        let saved = store.save_all(&requests).await.unwrap();
        assert_eq!(saved.len(), 3);
        assert!(saved[0].id < saved[1].id);
        assert!(saved[1].id < saved[2].id);
        assert_eq!(saved[0].service_id, "a");
        assert_eq!(saved[2].service_id, "c");
    }

    #[tokio::test]
    async fn fail_next_causes_a_bounded_number_of_failures() {
        let store = InMemoryRelationalStore::new(Arc::new(SystemProvider::new()));
        store.fail_next(1);
        assert!(store.save(&request("a")).await.is_err());
        assert!(store.save(&request("b")).await.is_ok());
    }

    #[tokio::test]
    async fn find_page_filters_by_service_id() {
        let store = InMemoryRelationalStore::new(Arc::new(SystemProvider::new()));
        store.save(&request("a")).await.unwrap();
        store.save(&request("b")).await.unwrap();

        let criteria = RelationalCriteria {
            service_id: Some("a".into()),
            level: None,
        };
        let (page, total) = store.find_page(&criteria, 0, 50).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].service_id, "a");
    }
}
