//! Store records → response records (§4.11 DTO mapping).

use std::collections::BTreeMap;

use logaggr_types::{LogDocument, LogEntryResponse, LogSearchResponse, NormalizedPage};

/// Assembles the final paginated response from a page of search-store
/// hits plus the sampled aggregation counts computed alongside them.
pub fn to_response(
    docs: Vec<LogDocument>,
    total: u64,
    page: NormalizedPage,
    level_counts: BTreeMap<String, u64>,
    service_counts: BTreeMap<String, u64>,
) -> LogSearchResponse {
    let logs = docs.iter().map(LogEntryResponse::from).collect();
    LogSearchResponse::new(logs, total, page, level_counts, service_counts)
}
