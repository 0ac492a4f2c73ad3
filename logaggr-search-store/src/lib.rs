//! Search-store adapter and criteria builder (§4.7, §3 `LogDocument`).
//!
//! Trait at the seam, concrete backend behind it (the same split
//! `logaggr-bus` uses): [`SearchStore`] is the contract;
//! [`elastic::ElasticsearchStore`] is the production backend using the
//! `elasticsearch` crate, the standard ecosystem client for this
//! capability; [`mock::InMemorySearchStore`] is the in-process stand-in
//! used by every test in this workspace that doesn't need a live
//! cluster.

mod criteria;
mod elastic;
mod mock;

pub use criteria::Criteria;
pub use elastic::ElasticsearchStore;
pub use mock::InMemorySearchStore;

use async_trait::async_trait;
use std::fmt::Debug;

use logaggr_types::LogDocument;

pub const INDEX_LOGS: &str = "logs";

#[derive(Debug, thiserror::Error)]
pub enum SearchStoreError {
    #[error("failed to encode document: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("search store transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("search store returned an error response: {0}")]
    Response(String),
}

/// Storage contract for the search index (§4.7 criteria builder plus
/// §4.8's paginated query requirements).
#[async_trait]
pub trait SearchStore: Debug + Send + Sync + 'static {
    /// Bulk-indexes `documents` (§4.3: the batch is indexed as a unit
    /// after relational persistence succeeds).
    async fn bulk_index(&self, documents: Vec<LogDocument>) -> Result<(), SearchStoreError>;

    /// Executes a criteria query sorted by `timestamp DESC`, returning
    /// up to `size` documents starting at `page * size` plus the total
    /// hit count (`trackTotalHits=true` in the Elasticsearch backend —
    /// §4.8).
    async fn query_page(
        &self,
        criteria: &Criteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogDocument>, u64), SearchStoreError>;
}
