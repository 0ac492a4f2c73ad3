//! Redis-backed [`SearchCache`] (§4.9, §6 "Cache namespace `log-searches`").
//!
//! §5 requires a process-external cache shared across instances, which
//! rules out an in-process `HashMap`/LRU. `redis` is the standard
//! ecosystem client for exactly this shape of shared, TTL'd key-value
//! cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use logaggr_types::LogSearchResponse;

use crate::backend::{CacheError, SearchCache};

pub const CACHE_NAMESPACE: &str = "log-searches";

/// A Redis-backed cache. Clones share the underlying connection (the
/// way `ConnectionManager` is designed to be used — it reconnects
/// transparently on transport errors).
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|err| CacheError::Transport(Box::new(err)))?;
        let conn = client
            .get_tokio_connection_manager()
            .await
            .map_err(|err| CacheError::Transport(Box::new(err)))?;
        Ok(Self { conn })
    }

    fn namespaced(key: &str) -> String {
        format!("{CACHE_NAMESPACE}:{key}")
    }
}

#[async_trait]
impl SearchCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<LogSearchResponse>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::namespaced(key))
            .await
            .map_err(|err| CacheError::Transport(Box::new(err)))?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &LogSearchResponse, ttl: Duration) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::namespaced(key), json, ttl.as_secs())
            .await
            .map_err(|err| CacheError::Transport(Box::new(err)))?;
        Ok(())
    }
}
