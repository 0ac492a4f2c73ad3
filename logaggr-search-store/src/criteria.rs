//! Criteria builder (§4.7): translates a [`LogSearchRequest`] into an
//! opaque criteria object. All present clauses are AND-combined;
//! absent filters are simply omitted. No filters at all degenerates to
//! match-all, which the emptiness check below makes explicit rather
//! than leaving implicit in "all fields are `None`".

use logaggr_time::Time;
use logaggr_types::{LogLevel, LogSearchRequest};

/// An AND-combination of the clauses named in §4.7. Kept as a plain
/// struct of optional fields rather than a generic query-builder value
/// — every backend this crate might grow still needs these exact five
/// clauses, nothing more expressive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub service_id: Option<String>,
    pub trace_id: Option<String>,
    pub level: Option<LogLevel>,
    pub time_range: Option<(Time, Time)>,
    /// Free-text match against `message`. The Elasticsearch backend
    /// tokenizes/lowercases both sides so `"Timeout"` matches the
    /// indexed token `"timeout"` (§4.7).
    pub query: Option<String>,
}

impl Criteria {
    /// Builds criteria from a search request, applying the §4.7 rules:
    /// blank strings are treated as absent, and a time range clause is
    /// only added when *both* bounds are present.
    pub fn build(request: &LogSearchRequest) -> Self {
        Self {
            service_id: non_blank(request.service_id.as_deref()),
            trace_id: non_blank(request.trace_id.as_deref()),
            level: request.level,
            time_range: match (request.start_timestamp, request.end_timestamp) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => None,
            },
            query: non_blank(request.query.as_deref()),
        }
    }

    /// True when every clause is absent — the §4.7/§8 match-all case,
    /// which must match every indexed document.
    pub fn is_match_all(&self) -> bool {
        self.service_id.is_none()
            && self.trace_id.is_none()
            && self.level.is_none()
            && self.time_range.is_none()
            && self.query.is_none()
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
