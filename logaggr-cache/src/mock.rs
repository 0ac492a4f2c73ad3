//! In-memory [`SearchCache`] for tests, with explicit TTL expiry driven
//! by an injectable clock rather than wall-clock sleeps.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use logaggr_time::{Time, TimeProviderRef};
use logaggr_types::LogSearchResponse;

use crate::backend::{CacheError, SearchCache};

struct Entry {
    value: LogSearchResponse,
    expires_at: Time,
}

#[derive(Debug)]
pub struct InMemoryCache {
    clock: TimeProviderRef,
    entries: Mutex<HashMap<String, Entry>>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry").field("expires_at", &self.expires_at).finish()
    }
}

impl InMemoryCache {
    pub fn new(clock: TimeProviderRef) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SearchCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<LogSearchResponse>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &LogSearchResponse, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Time::from_datetime(
            self.clock.now().as_datetime() + chrono::Duration::from_std(ttl).unwrap_or_default(),
        );
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaggr_time::MockProvider;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn sample_response() -> LogSearchResponse {
        LogSearchResponse::new(
            vec![],
            0,
            logaggr_types::NormalizedPage { page: 0, size: 50 },
            BTreeMap::new(),
            BTreeMap::new(),
        )
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let clock = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let cache = InMemoryCache::new(clock.clone());
        cache.put("k", &sample_response(), Duration::from_secs(300)).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        clock.inc(chrono::Duration::seconds(301));
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }
}
