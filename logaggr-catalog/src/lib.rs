//! Relational store adapter (§4.4): the authoritative identity-assigning
//! row store behind `LogEntry`.
//!
//! A trait describes the storage contract; a concrete `sqlx`/Postgres
//! implementation sits behind it, with a pooled connection, `JSONB`
//! metadata columns, and transactional batch insert. Identity
//! allocation follows the classic hi-lo pattern: a Postgres sequence
//! stepped by [`ID_BLOCK_SIZE`] hands out a block of ids per round trip
//! rather than one id per insert (§4.4).

mod error;
mod idgen;
mod mem;
mod pg;

pub use error::CatalogError;
pub use idgen::{IdBlockAllocator, ID_BLOCK_SIZE};
pub use mem::InMemoryRelationalStore;
pub use pg::PgRelationalStore;

use async_trait::async_trait;
use std::fmt::Debug;

use logaggr_types::{LogEntry, LogEntryRequest, LogLevel};

/// Filterable fields for [`RelationalStore::find_page`] (§4.4: `serviceId`
/// and `level` are filterable but not necessarily indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationalCriteria {
    pub service_id: Option<String>,
    pub level: Option<LogLevel>,
}

/// Storage contract for the relational store (§4.4).
///
/// `save`/`save_all` assign identity on insert; `find_page` is sorted by
/// `timestamp DESC` by default, matching the search path's default sort.
#[async_trait]
pub trait RelationalStore: Debug + Send + Sync + 'static {
    async fn save(&self, request: &LogEntryRequest) -> Result<LogEntry, CatalogError>;

    /// Inserts all `requests` within a single transaction (§4.3), in
    /// input order — callers rely on `result[i]` corresponding to
    /// `requests[i]`.
    async fn save_all(&self, requests: &[LogEntryRequest]) -> Result<Vec<LogEntry>, CatalogError>;

    async fn find_page(
        &self,
        criteria: &RelationalCriteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogEntry>, u64), CatalogError>;
}

pub(crate) fn matches(criteria: &RelationalCriteria, entry: &LogEntry) -> bool {
    if let Some(service_id) = &criteria.service_id {
        if &entry.service_id != service_id {
            return false;
        }
    }
    if let Some(level) = criteria.level {
        if entry.level != level {
            return false;
        }
    }
    true
}

pub(crate) fn paginate(mut entries: Vec<LogEntry>, page: u32, size: u32) -> (Vec<LogEntry>, u64) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let total = entries.len() as u64;
    let start = (page as u64 * size as u64) as usize;
    if start >= entries.len() {
        return (Vec::new(), total);
    }
    let end = (start + size as usize).min(entries.len());
    (entries[start..end].to_vec(), total)
}
