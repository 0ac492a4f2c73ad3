//! Content-addressed search-result cache (§4.9).
//!
//! [`CachedSearch`] fronts a [`logaggr_search_service::SearchService`]
//! with a fingerprint-keyed [`SearchCache`]; [`mock::InMemoryCache`] is
//! the deterministic test double, [`redis_backend::RedisCache`] the
//! production backend.

mod backend;
mod cached_search;
mod fingerprint;
pub mod mock;
mod redis_backend;

pub use backend::{CacheError, SearchCache};
pub use cached_search::{CachedSearch, CACHE_TTL};
pub use fingerprint::fingerprint;
pub use redis_backend::{RedisCache, CACHE_NAMESPACE};
