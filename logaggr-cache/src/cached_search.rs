//! Content-addressed caching with negative-result suppression (§4.9).

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use logaggr_search_service::{SearchService, SearchServiceError};
use logaggr_types::{LogSearchRequest, LogSearchResponse};

use crate::backend::SearchCache;
use crate::fingerprint::fingerprint;

/// Cache entries expire 5 minutes after insertion (§4.9 point 4).
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Fronts a [`SearchService`] with a fingerprint-keyed cache. A `None`
/// cache degrades the service to always calling through (§4.9 point 5).
#[derive(Debug)]
pub struct CachedSearch {
    service: Arc<SearchService>,
    cache: Option<Arc<dyn SearchCache>>,
}

impl CachedSearch {
    pub fn new(service: Arc<SearchService>, cache: Option<Arc<dyn SearchCache>>) -> Self {
        Self { service, cache }
    }

    /// `search_with_cache(request)` (§4.9 points 1-4): probe the cache,
    /// fall through to [`SearchService::search_with_metrics`] on a miss,
    /// and cache the DTO-mapped result only if it is non-empty.
    pub async fn search_with_cache(
        &self,
        request: &LogSearchRequest,
    ) -> Result<LogSearchResponse, SearchServiceError> {
        let key = fingerprint(request);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "cache read failed, degrading to direct search"),
            }
        }

        let response = self.service.search_with_metrics(request).await?;

        if let Some(cache) = &self.cache {
            if !response.is_empty() {
                if let Err(err) = cache.put(&key, &response, CACHE_TTL).await {
                    warn!(error = %err, "cache write failed");
                }
            }
        }

        Ok(response)
    }

    /// `search_without_cache(request)` (§4.9 last line): bypasses both
    /// the read and write paths unconditionally.
    pub async fn search_without_cache(
        &self,
        request: &LogSearchRequest,
    ) -> Result<LogSearchResponse, SearchServiceError> {
        self.service.search_with_metrics(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use logaggr_search_store::{Criteria, InMemorySearchStore, SearchStore, SearchStoreError};
    use logaggr_time::{MockProvider, Time, TimeProviderRef};
    use logaggr_types::{LogDocument, LogEntryRequest, LogLevel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::mock::InMemoryCache;

    #[derive(Debug)]
    struct CountingStore {
        inner: InMemorySearchStore,
        query_calls: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemorySearchStore::new(),
                query_calls: AtomicUsize::new(0),
            }
        }

        fn query_calls(&self) -> usize {
            self.query_calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl SearchStore for CountingStore {
        async fn bulk_index(&self, documents: Vec<LogDocument>) -> Result<(), SearchStoreError> {
            self.inner.bulk_index(documents).await
        }

        async fn query_page(
            &self,
            criteria: &Criteria,
            page: u32,
            size: u32,
        ) -> Result<(Vec<LogDocument>, u64), SearchStoreError> {
            self.query_calls.fetch_add(1, Ordering::Relaxed);
            self.inner.query_page(criteria, page, size).await
        }
    }

    fn request(service_id: &str) -> LogEntryRequest {
        LogEntryRequest {
            timestamp: Time::from_datetime(chrono::Utc::now()),
            service_id: service_id.into(),
            level: LogLevel::Info,
            message: "hello".into(),
            metadata: None,
            trace_id: None,
        }
    }

    fn clock() -> TimeProviderRef {
        Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())))
    }

    async fn harness() -> (Arc<CountingStore>, CachedSearch) {
        let store = Arc::new(CountingStore::new());
        let doc = LogDocument::from_request(&request("checkout"), Time::from_datetime(chrono::Utc::now()))
            .with_postgres_id(1);
        store.bulk_index(vec![doc]).await.unwrap();

        let service = Arc::new(SearchService::new(store.clone()));
        let cache: Arc<dyn SearchCache> = Arc::new(InMemoryCache::new(clock()));
        let cached = CachedSearch::new(service, Some(cache));
        (store, cached)
    }

    #[tokio::test]
    async fn non_empty_result_hits_the_store_exactly_once() {
        let (store, cached) = harness().await;
        let request = LogSearchRequest { service_id: Some("checkout".into()), ..Default::default() };

        let first = cached.search_with_cache(&request).await.unwrap();
        let second = cached.search_with_cache(&request).await.unwrap();

        assert_eq!(first.total_elements, 1);
        assert_eq!(second.total_elements, 1);
        // Two query_page calls per miss (page + aggregation sample),
        // none on the cache hit.
        assert_eq!(store.query_calls(), 2);
    }

    #[tokio::test]
    async fn empty_result_is_never_cached() {
        let (store, cached) = harness().await;
        let request = LogSearchRequest { service_id: Some("nonexistent".into()), ..Default::default() };

        cached.search_with_cache(&request).await.unwrap();
        cached.search_with_cache(&request).await.unwrap();

        assert_eq!(store.query_calls(), 4);
    }

    #[tokio::test]
    async fn distinct_filters_produce_distinct_cache_entries() {
        let (store, cached) = harness().await;
        let info = LogSearchRequest { level: Some(LogLevel::Info), ..Default::default() };
        let error = LogSearchRequest { level: Some(LogLevel::Error), ..Default::default() };

        cached.search_with_cache(&info).await.unwrap();
        cached.search_with_cache(&error).await.unwrap();

        assert_eq!(store.query_calls(), 4);
    }

    #[tokio::test]
    async fn search_without_cache_always_invokes_the_store() {
        let (store, cached) = harness().await;
        let request = LogSearchRequest { service_id: Some("checkout".into()), ..Default::default() };

        cached.search_without_cache(&request).await.unwrap();
        cached.search_without_cache(&request).await.unwrap();

        assert_eq!(store.query_calls(), 4);
    }

    #[tokio::test]
    async fn null_cache_degrades_to_direct_search() {
        let store = Arc::new(CountingStore::new());
        let service = Arc::new(SearchService::new(store.clone()));
        let cached = CachedSearch::new(service, None);

        let response = cached
            .search_with_cache(&LogSearchRequest::default())
            .await
            .unwrap();
        assert!(response.is_empty());
        assert_eq!(store.query_calls(), 2);
    }
}
