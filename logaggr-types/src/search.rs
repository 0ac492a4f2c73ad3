use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use logaggr_time::Time;

use crate::entry::LogEntry;
use crate::level::LogLevel;
use crate::metadata::Metadata;

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_SIZE: u32 = 50;
pub const MAX_SIZE: u32 = 1000;

const MAX_TIME_RANGE_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Search filter DTO (§3 `LogSearchRequest`). `page`/`size` are accepted
/// raw (possibly absent or out of range) and normalized by
/// [`LogSearchRequest::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchValidationError {
    #[error("startTimestamp must not be after endTimestamp")]
    StartAfterEnd,
    #[error("endTimestamp - startTimestamp must not exceed 7 days")]
    RangeTooWide,
}

/// `page`/`size` after applying the defaulting/clamping rules in §3 and
/// the boundary table in §8: an out-of-range `size` (including `<= 0`
/// or `> 1000`) falls back to the default of 50 rather than being
/// clamped to the nearest bound, and a negative or absent `page` falls
/// back to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedPage {
    pub page: u32,
    pub size: u32,
}

impl LogSearchRequest {
    /// Validate the time-range invariant from §3. Must be called before
    /// the request reaches the search store (§8 scenario 6).
    pub fn validate_time_range(&self) -> Result<(), SearchValidationError> {
        if let (Some(start), Some(end)) = (self.start_timestamp, self.end_timestamp) {
            if start > end {
                return Err(SearchValidationError::StartAfterEnd);
            }
            let span = end.duration_since(start);
            if span.num_milliseconds() > MAX_TIME_RANGE_MILLIS {
                return Err(SearchValidationError::RangeTooWide);
            }
        }
        Ok(())
    }

    pub fn normalized_page(&self) -> NormalizedPage {
        let page = match self.page {
            Some(p) if p >= 0 => p as u32,
            _ => DEFAULT_PAGE,
        };
        let size = match self.size {
            Some(s) if s > 0 && s <= MAX_SIZE as i64 => s as u32,
            _ => DEFAULT_SIZE,
        };
        NormalizedPage { page, size }
    }

    pub fn is_blank_query(query: &Option<String>) -> bool {
        query.as_deref().map(str::trim).unwrap_or("").is_empty()
    }
}

/// Response shape for a single log entry (DTO mapping, §4.11 §2 table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryResponse {
    pub id: i64,
    pub timestamp: Time,
    pub service_id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub created_at: Time,
}

impl From<&LogEntry> for LogEntryResponse {
    fn from(e: &LogEntry) -> Self {
        Self {
            id: e.id,
            timestamp: e.timestamp,
            service_id: e.service_id.clone(),
            level: e.level,
            message: e.message.clone(),
            metadata: e.metadata.clone(),
            trace_id: e.trace_id.clone(),
            created_at: e.created_at,
        }
    }
}

impl From<&crate::entry::LogDocument> for LogEntryResponse {
    /// Maps a search-store hit onto the response shape (§4.9, §4.11).
    /// `id` is the linked relational identity; per the §3 invariant a
    /// document reaching this conversion is expected to carry one, but
    /// a still-unlinked document (the `None` case is transient, never
    /// by design — see [`LogDocument::postgres_id`](crate::entry::LogDocument))
    /// falls back to `0` rather than panicking.
    fn from(d: &crate::entry::LogDocument) -> Self {
        Self {
            id: d.postgres_id.unwrap_or_default(),
            timestamp: d.timestamp,
            service_id: d.service_id.clone(),
            level: d.level,
            message: d.message.clone(),
            metadata: d.metadata.clone(),
            trace_id: d.trace_id.clone(),
            created_at: d.created_at,
        }
    }
}

/// Final paginated search response (§8: `total_pages = ceil(total_elements / size)`,
/// `0 <= current_page < max(1, total_pages)`, `|logs| <= size`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSearchResponse {
    pub logs: Vec<LogEntryResponse>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub size: u32,
    pub level_counts: BTreeMap<String, u64>,
    pub service_counts: BTreeMap<String, u64>,
}

impl LogSearchResponse {
    pub fn new(
        logs: Vec<LogEntryResponse>,
        total_elements: u64,
        page: NormalizedPage,
        level_counts: BTreeMap<String, u64>,
        service_counts: BTreeMap<String, u64>,
    ) -> Self {
        let total_pages = if page.size == 0 {
            0
        } else {
            (total_elements + page.size as u64 - 1) / page.size as u64
        };
        Self {
            logs,
            total_elements,
            total_pages,
            current_page: page.page,
            size: page.size,
            level_counts,
            service_counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaggr_time::SystemProvider;
    use logaggr_time::TimeProvider;

    #[test]
    fn size_zero_normalizes_to_default() {
        let r = LogSearchRequest { size: Some(0), ..Default::default() };
        assert_eq!(r.normalized_page().size, DEFAULT_SIZE);
    }

    #[test]
    fn size_over_max_normalizes_to_default() {
        let r = LogSearchRequest { size: Some(1001), ..Default::default() };
        assert_eq!(r.normalized_page().size, DEFAULT_SIZE);
    }

    #[test]
    fn size_absent_normalizes_to_default() {
        let r = LogSearchRequest::default();
        assert_eq!(r.normalized_page().size, DEFAULT_SIZE);
    }

    #[test]
    fn size_at_max_is_kept() {
        let r = LogSearchRequest { size: Some(1000), ..Default::default() };
        assert_eq!(r.normalized_page().size, 1000);
    }

    #[test]
    fn page_negative_normalizes_to_zero() {
        let r = LogSearchRequest { page: Some(-1), ..Default::default() };
        assert_eq!(r.normalized_page().page, 0);
    }

    #[test]
    fn page_absent_normalizes_to_zero() {
        let r = LogSearchRequest::default();
        assert_eq!(r.normalized_page().page, 0);
    }

    #[test]
    fn exact_seven_day_range_accepted() {
        let now = SystemProvider::new().now();
        let end = Time::from_datetime(now.as_datetime() + chrono::Duration::days(7));
        let r = LogSearchRequest {
            start_timestamp: Some(now),
            end_timestamp: Some(end),
            ..Default::default()
        };
        assert!(r.validate_time_range().is_ok());
    }

    #[test]
    fn seven_days_plus_one_ms_rejected() {
        let now = SystemProvider::new().now();
        let end = Time::from_datetime(
            now.as_datetime() + chrono::Duration::days(7) + chrono::Duration::milliseconds(1),
        );
        let r = LogSearchRequest {
            start_timestamp: Some(now),
            end_timestamp: Some(end),
            ..Default::default()
        };
        assert_eq!(r.validate_time_range(), Err(SearchValidationError::RangeTooWide));
    }

    #[test]
    fn start_after_end_rejected() {
        let now = SystemProvider::new().now();
        let earlier = Time::from_datetime(now.as_datetime() - chrono::Duration::seconds(1));
        let r = LogSearchRequest {
            start_timestamp: Some(now),
            end_timestamp: Some(earlier),
            ..Default::default()
        };
        assert_eq!(r.validate_time_range(), Err(SearchValidationError::StartAfterEnd));
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        let page = NormalizedPage { page: 0, size: 50 };
        let resp = LogSearchResponse::new(vec![], 101, page, BTreeMap::new(), BTreeMap::new());
        assert_eq!(resp.total_pages, 3);
    }
}
