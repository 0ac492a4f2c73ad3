//! Paginated search plus sampled aggregation (§4.8).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use logaggr_search_store::{Criteria, SearchStore, SearchStoreError};
use logaggr_types::{LogSearchRequest, LogSearchResponse, SearchValidationError};

use crate::dto::to_response;

/// Hit count the aggregation query samples (§4.8). DESIGN.md records
/// the decision to keep this a constant rather than a config field.
pub const AGGREGATION_SAMPLE_SIZE: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum SearchServiceError {
    #[error(transparent)]
    Validation(#[from] SearchValidationError),
    #[error(transparent)]
    Store(#[from] SearchStoreError),
}

/// Validates, builds criteria, and queries the search store (§4.8).
#[derive(Debug)]
pub struct SearchService {
    store: Arc<dyn SearchStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self { store }
    }

    /// `search(request)`: the plain paginated query, no aggregations.
    pub async fn search(&self, request: &LogSearchRequest) -> Result<LogSearchResponse, SearchServiceError> {
        request.validate_time_range()?;
        let criteria = Criteria::build(request);
        let page = request.normalized_page();
        let (docs, total) = self.store.query_page(&criteria, page.page, page.size).await?;
        Ok(to_response(docs, total, page, BTreeMap::new(), BTreeMap::new()))
    }

    /// `search_with_metrics(request)`: the paginated query plus a
    /// second, sampled query over the first [`AGGREGATION_SAMPLE_SIZE`]
    /// hits to compute level/service counts. A failed aggregation query
    /// never fails the overall request (§4.8, §7 `AggregationFailure`).
    pub async fn search_with_metrics(
        &self,
        request: &LogSearchRequest,
    ) -> Result<LogSearchResponse, SearchServiceError> {
        request.validate_time_range()?;
        let criteria = Criteria::build(request);
        let page = request.normalized_page();
        let (docs, total) = self.store.query_page(&criteria, page.page, page.size).await?;

        let (level_counts, service_counts) = self.sampled_aggregations(&criteria).await;

        Ok(to_response(docs, total, page, level_counts, service_counts))
    }

    async fn sampled_aggregations(
        &self,
        criteria: &Criteria,
    ) -> (BTreeMap<String, u64>, BTreeMap<String, u64>) {
        match self.store.query_page(criteria, 0, AGGREGATION_SAMPLE_SIZE).await {
            Ok((docs, _total)) => {
                let mut level_counts = BTreeMap::new();
                let mut service_counts = BTreeMap::new();
                for doc in &docs {
                    *level_counts.entry(doc.level.as_str().to_string()).or_insert(0) += 1;
                    *service_counts.entry(doc.service_id.clone()).or_insert(0) += 1;
                }
                (level_counts, service_counts)
            }
            Err(err) => {
                warn!(error = %err, "sampled aggregation query failed, returning empty counts");
                (BTreeMap::new(), BTreeMap::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaggr_search_store::InMemorySearchStore;
    use logaggr_time::Time;
    use logaggr_types::{LogEntryRequest, LogLevel};

    fn doc(service_id: &str, level: LogLevel, message: &str) -> LogEntryRequest {
        LogEntryRequest {
            timestamp: Time::from_datetime(chrono::Utc::now()),
            service_id: service_id.into(),
            level,
            message: message.into(),
            metadata: None,
            trace_id: None,
        }
    }

    async fn seeded_service() -> SearchService {
        let store = Arc::new(InMemorySearchStore::new());
        let now = Time::from_datetime(chrono::Utc::now());
        let requests = vec![
            doc("checkout", LogLevel::Info, "order placed"),
            doc("checkout", LogLevel::Error, "payment failed"),
            doc("billing", LogLevel::Info, "invoice sent"),
        ];
        let docs = requests
            .iter()
            .enumerate()
            .map(|(i, r)| logaggr_types::LogDocument::from_request(r, now).with_postgres_id(i as i64 + 1))
            .collect();
        store.bulk_index(docs).await.unwrap();
        SearchService::new(store)
    }

    #[tokio::test]
    async fn search_returns_empty_aggregations() {
        let service = seeded_service().await;
        let response = service.search(&LogSearchRequest::default()).await.unwrap();
        assert_eq!(response.total_elements, 3);
        assert!(response.level_counts.is_empty());
        assert!(response.service_counts.is_empty());
    }

    #[tokio::test]
    async fn search_with_metrics_computes_exact_counts_under_sample_size() {
        let service = seeded_service().await;
        let response = service
            .search_with_metrics(&LogSearchRequest::default())
            .await
            .unwrap();
        assert_eq!(response.total_elements, 3);
        assert_eq!(response.level_counts.get("INFO"), Some(&2));
        assert_eq!(response.level_counts.get("ERROR"), Some(&1));
        assert_eq!(response.service_counts.get("checkout"), Some(&2));
        assert_eq!(response.service_counts.get("billing"), Some(&1));
    }

    #[tokio::test]
    async fn rejected_time_range_never_reaches_the_store() {
        let service = seeded_service().await;
        let now = Time::from_datetime(chrono::Utc::now());
        let earlier = Time::from_datetime(now.as_datetime() - chrono::Duration::seconds(1));
        let request = LogSearchRequest {
            start_timestamp: Some(now),
            end_timestamp: Some(earlier),
            ..Default::default()
        };
        assert!(matches!(
            service.search(&request).await,
            Err(SearchServiceError::Validation(SearchValidationError::StartAfterEnd))
        ));
    }
}
