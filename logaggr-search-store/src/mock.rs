//! In-memory [`SearchStore`] for tests — mirrors `logaggr-bus::mock::MockBus`:
//! no network, just a `Vec` behind a lock, with the same filtering
//! semantics the Elasticsearch backend's query DSL expresses.

use async_trait::async_trait;
use parking_lot::Mutex;

use logaggr_types::LogDocument;

use crate::{Criteria, SearchStore, SearchStoreError};

#[derive(Debug, Default)]
pub struct InMemorySearchStore {
    documents: Mutex<Vec<LogDocument>>,
}

impl InMemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches(criteria: &Criteria, doc: &LogDocument) -> bool {
    if let Some(service_id) = &criteria.service_id {
        if &doc.service_id != service_id {
            return false;
        }
    }
    if let Some(trace_id) = &criteria.trace_id {
        if doc.trace_id.as_deref() != Some(trace_id.as_str()) {
            return false;
        }
    }
    if let Some(level) = criteria.level {
        if doc.level != level {
            return false;
        }
    }
    if let Some((start, end)) = criteria.time_range {
        if doc.timestamp < start || doc.timestamp > end {
            return false;
        }
    }
    if let Some(query) = &criteria.query {
        let needle = query.to_ascii_lowercase();
        if !doc.message.to_ascii_lowercase().contains(&needle) {
            return false;
        }
    }
    true
}

#[async_trait]
impl SearchStore for InMemorySearchStore {
    async fn bulk_index(&self, documents: Vec<LogDocument>) -> Result<(), SearchStoreError> {
        self.documents.lock().extend(documents);
        Ok(())
    }

    async fn query_page(
        &self,
        criteria: &Criteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogDocument>, u64), SearchStoreError> {
        let mut matched: Vec<LogDocument> = self
            .documents
            .lock()
            .iter()
            .filter(|d| matches(criteria, d))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matched.len() as u64;
        let start = (page as u64 * size as u64) as usize;
        if start >= matched.len() {
            return Ok((Vec::new(), total));
        }
        let end = (start + size as usize).min(matched.len());
        Ok((matched[start..end].to_vec(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaggr_time::Time;
    use logaggr_types::{LogEntryRequest, LogLevel};

    fn doc(service_id: &str, message: &str) -> LogDocument {
        let request = LogEntryRequest {
            timestamp: Time::from_datetime(chrono::Utc::now()),
            service_id: service_id.into(),
            level: LogLevel::Info,
            message: message.into(),
            metadata: None,
            trace_id: None,
        };
        LogDocument::from_request(&request, Time::from_datetime(chrono::Utc::now()))
    }

    #[tokio::test]
    async fn match_all_criteria_returns_every_document() {
        let store = InMemorySearchStore::new();
        store.bulk_index(vec![doc("a", "hello"), doc("b", "world")]).await.unwrap();

        let (page, total) = store.query_page(&Criteria::default(), 0, 50).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn free_text_query_is_case_insensitive() {
        let store = InMemorySearchStore::new();
        store.bulk_index(vec![doc("a", "Connection Timeout")]).await.unwrap();

        let criteria = Criteria {
            query: Some("timeout".into()),
            ..Default::default()
        };
        let (page, total) = store.query_page(&criteria, 0, 50).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].service_id, "a");
    }

    #[tokio::test]
    async fn service_id_filter_narrows_results() {
        let store = InMemorySearchStore::new();
        store.bulk_index(vec![doc("a", "x"), doc("b", "y")]).await.unwrap();

        let criteria = Criteria {
            service_id: Some("b".into()),
            ..Default::default()
        };
        let (page, total) = store.query_page(&criteria, 0, 50).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].service_id, "b");
    }
}
