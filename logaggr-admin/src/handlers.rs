//! Route handlers for the three DLQ routes plus the ambient health
//! route (§6).

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use logaggr_metric::names;
use logaggr_time::TimeProvider;

use crate::state::AdminState;
use crate::TOPIC_LOGS_DLQ;

/// Health probe budget (§4.10, §5): 500ms per request, 5s overall.
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);
const PROBE_OVERALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Threshold beyond which the derived health status flips to WARNING
/// (§4.10).
const DLQ_RATE_WARNING_PERCENT: f64 = 1.0;
const CONSUMER_LAG_WARNING: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
}

/// `GET /admin/dlq/status`.
pub async fn dlq_status(State(state): State<AdminState>) -> Json<Value> {
    let dlq_total = state.metrics.counter(names::LOGS_DLQ_TOTAL).get();
    Json(json!({
        "topic": TOPIC_LOGS_DLQ,
        "dlqTotal": dlq_total,
        "checkedAt": state.clock.now().to_rfc3339(),
    }))
}

/// `GET /admin/dlq/metrics`: the derived `dlq_rate_percent` and
/// `consumer_lag` from §4.10, plus the health status they gate.
pub async fn dlq_metrics(State(state): State<AdminState>) -> Json<Value> {
    let published = state.metrics.counter(names::LOGS_PUBLISHED_TOTAL).get();
    let consumed = state.metrics.counter(names::LOGS_CONSUMED_TOTAL).get();
    let dlq_total = state.metrics.counter(names::LOGS_DLQ_TOTAL).get();

    let dlq_rate_percent = if consumed == 0 {
        0.0
    } else {
        (dlq_total as f64 / consumed as f64) * 100.0
    };
    let consumer_lag = published.saturating_sub(consumed);

    let health_status = if dlq_rate_percent > DLQ_RATE_WARNING_PERCENT || consumer_lag > CONSUMER_LAG_WARNING {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    Json(json!({
        "logsPublishedTotal": published,
        "logsConsumedTotal": consumed,
        "logsDlqTotal": dlq_total,
        "dlqRatePercent": dlq_rate_percent,
        "consumerLag": consumer_lag,
        "healthStatus": health_status,
    }))
}

/// `GET /admin/dlq/info`: static operator instructions.
pub async fn dlq_info() -> Json<Value> {
    Json(json!({
        "topic": TOPIC_LOGS_DLQ,
        "instructions": [
            "The DLQ inspector does not run by default; enable it on-demand (consumer group dlq-inspector) to observe dead-lettered records.",
            "Each dead-lettered record carries dlq-error, dlq-error-code, dlq-original-partition, dlq-original-offset, and dlq-timestamp in its metadata.",
            "There is no automatic reprocessing path. Inspect, fix the root cause, and replay manually if the record is still needed.",
        ],
    }))
}

/// `GET /admin/health`: the bus cluster health probe (§4.10, expansion
/// in §2a).
pub async fn health(State(state): State<AdminState>) -> Json<Value> {
    let probe = state.bus_admin.describe_cluster(PROBE_REQUEST_TIMEOUT);
    let outcome = tokio::time::timeout(PROBE_OVERALL_TIMEOUT, probe).await;

    match outcome {
        Ok(Ok(logaggr_bus::ClusterHealth::Up { cluster_id, node_count })) => Json(json!({
            "status": "UP",
            "clusterId": cluster_id,
            "nodeCount": node_count,
        })),
        Ok(Ok(logaggr_bus::ClusterHealth::Down { error_class, message })) => Json(json!({
            "status": "DOWN",
            "errorClass": error_class,
            "message": message,
        })),
        Ok(Err(err)) => Json(json!({
            "status": "DOWN",
            "errorClass": "transport",
            "message": err.to_string(),
        })),
        Err(_) => Json(json!({
            "status": "DOWN",
            "errorClass": "timeout",
            "message": format!("health probe did not complete within {:?}", PROBE_OVERALL_TIMEOUT),
        })),
    }
}
