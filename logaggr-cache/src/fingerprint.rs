//! Deterministic request fingerprinting (§4.9).

use serde::Serialize;
use sha2::{Digest, Sha256};

use logaggr_time::Time;
use logaggr_types::{LogLevel, LogSearchRequest};

/// The subset of a [`LogSearchRequest`] that determines its cache key:
/// every filter field plus the *normalized* page/size. Normalizing
/// first means `page: None` and `page: Some(0)` fingerprint identically
/// — they describe the same query — while any differing filter still
/// produces a distinct key (§8 scenario 4).
#[derive(Serialize)]
struct FingerprintInput<'a> {
    service_id: &'a Option<String>,
    level: &'a Option<LogLevel>,
    trace_id: &'a Option<String>,
    start_timestamp: &'a Option<Time>,
    end_timestamp: &'a Option<Time>,
    query: &'a Option<String>,
    page: u32,
    size: u32,
}

/// Computes the stable fingerprint used as the cache key (§4.9).
pub fn fingerprint(request: &LogSearchRequest) -> String {
    let page = request.normalized_page();
    let input = FingerprintInput {
        service_id: &request.service_id,
        level: &request.level,
        trace_id: &request.trace_id,
        start_timestamp: &request.start_timestamp,
        end_timestamp: &request.end_timestamp,
        query: &request.query,
        page: page.page,
        size: page.size,
    };
    let json = serde_json::to_vec(&input).expect("fingerprint input is always serializable");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_requests_fingerprint_identically() {
        let a = LogSearchRequest {
            service_id: Some("checkout".into()),
            level: Some(LogLevel::Info),
            ..Default::default()
        };
        let b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn page_none_and_page_zero_fingerprint_identically() {
        let a = LogSearchRequest::default();
        let b = LogSearchRequest { page: Some(0), ..Default::default() };
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn differing_level_fingerprints_differently() {
        let a = LogSearchRequest { level: Some(LogLevel::Info), ..Default::default() };
        let b = LogSearchRequest { level: Some(LogLevel::Error), ..Default::default() };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
