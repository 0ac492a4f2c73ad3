//! The [`SearchCache`] trait and its errors.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use logaggr_types::LogSearchResponse;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to encode cached response: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("cache transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Storage contract for the `log-searches` namespace (§4.9, §6). A
/// `None` return from `get` means "not cached", not an error.
#[async_trait]
pub trait SearchCache: Debug + Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<LogSearchResponse>, CacheError>;

    async fn put(&self, key: &str, value: &LogSearchResponse, ttl: Duration) -> Result<(), CacheError>;
}
