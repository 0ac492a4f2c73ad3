//! Dead-letter routing and passive inspection (§4.4, §4.5, §4.6).

use std::sync::Arc;

use logaggr_metric::{names, Registry};
use logaggr_time::TimeProviderRef;
use logaggr_types::{LogEntryRequest, MetadataValue};
use tracing::{error, warn};

use crate::core::{BusRecord, BusWriting, DlqCause, TOPIC_LOGS_DLQ};

const META_TIMESTAMP: &str = "dlq-timestamp";
const META_ERROR: &str = "dlq-error";
const META_ERROR_CODE: &str = "dlq-error-code";
const META_ORIGINAL_PARTITION: &str = "dlq-original-partition";
const META_ORIGINAL_OFFSET: &str = "dlq-original-offset";

/// Publishes a failed request to the DLQ topic, enriched with the
/// metadata keys from §4.5. Construction failures (a payload that
/// isn't even valid JSON) are tagged `decode-error` since there's no
/// [`DlqCause`] to ask for an error code.
#[derive(Debug)]
pub struct DlqErrorHandler {
    bus: Arc<dyn BusWriting>,
    metrics: Registry,
    clock: TimeProviderRef,
}

impl DlqErrorHandler {
    pub fn new(bus: Arc<dyn BusWriting>, metrics: Registry, clock: TimeProviderRef) -> Self {
        Self { bus, metrics, clock }
    }

    /// Route a request that failed downstream processing (§4.4 point 2).
    pub async fn route(&self, request: &LogEntryRequest, cause: &dyn DlqCause, record: &BusRecord) {
        self.publish(request.clone(), cause.error_code(), &cause.to_string(), record)
            .await;
    }

    /// Route a record whose payload could not even be decoded into a
    /// [`LogEntryRequest`] (§4.4 point 1). There is no request to carry
    /// forward, so the original bytes are preserved as the message body.
    pub async fn route_decode_failure(&self, record: &BusRecord, error: &str) {
        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert(META_TIMESTAMP.to_string(), MetadataValue::string(self.clock.now().to_rfc3339()));
        metadata.insert(META_ERROR.to_string(), MetadataValue::string(error));
        metadata.insert(META_ERROR_CODE.to_string(), MetadataValue::string("decode-error"));
        metadata.insert(META_ORIGINAL_PARTITION.to_string(), MetadataValue::integer(record.partition as i64));
        metadata.insert(META_ORIGINAL_OFFSET.to_string(), MetadataValue::integer(record.offset));

        let payload = serde_json::json!({
            "rawPayload": String::from_utf8_lossy(&record.payload),
            "metadata": metadata,
        });
        if let Ok(bytes) = serde_json::to_vec(&payload) {
            if let Err(err) = self.bus.send(TOPIC_LOGS_DLQ, &record.key, bytes).await {
                error!(critical = true, error = %err, "failed to publish undecodable record to dlq; record is lost");
            }
        }
        self.metrics.counter(names::LOGS_DLQ_TOTAL).inc(1);
    }

    async fn publish(&self, mut request: LogEntryRequest, error_code: &str, error: &str, record: &BusRecord) {
        let mut metadata = request.metadata.take().unwrap_or_default();
        metadata.insert(META_TIMESTAMP.to_string(), MetadataValue::string(self.clock.now().to_rfc3339()));
        metadata.insert(META_ERROR.to_string(), MetadataValue::string(error));
        metadata.insert(META_ERROR_CODE.to_string(), MetadataValue::string(error_code));
        metadata.insert(META_ORIGINAL_PARTITION.to_string(), MetadataValue::integer(record.partition as i64));
        metadata.insert(META_ORIGINAL_OFFSET.to_string(), MetadataValue::integer(record.offset));
        request.metadata = Some(metadata);

        match serde_json::to_vec(&request) {
            Ok(bytes) => {
                if let Err(err) = self.bus.send(TOPIC_LOGS_DLQ, &request.service_id, bytes).await {
                    error!(critical = true, error = %err, service_id = %request.service_id, "failed to publish to dlq; record is lost");
                }
            }
            Err(err) => error!(critical = true, error = %err, service_id = %request.service_id, "failed to encode dlq record; record is lost"),
        }
        self.metrics.counter(names::LOGS_DLQ_TOTAL).inc(1);
    }
}

const UNKNOWN: &str = "unknown";

/// Pulls `service_id`/`dlq-error`/`dlq-timestamp` out of a dead-lettered
/// record for the §4.6 WARN line. Most records are an enriched
/// [`LogEntryRequest`] (from [`DlqErrorHandler::route`]); records that
/// failed to decode in the first place ([`DlqErrorHandler::route_decode_failure`])
/// carry the `rawPayload`/`metadata` envelope instead, with no top-level
/// `service_id` field — the record's key stands in for it there.
fn decode_for_logging(record: &BusRecord) -> (String, String, String) {
    if let Ok(request) = serde_json::from_slice::<LogEntryRequest>(&record.payload) {
        let metadata = request.metadata.unwrap_or_default();
        return (
            request.service_id,
            metadata.get(META_ERROR).and_then(MetadataValue::as_str).unwrap_or(UNKNOWN).to_string(),
            metadata.get(META_TIMESTAMP).and_then(MetadataValue::as_str).unwrap_or(UNKNOWN).to_string(),
        );
    }

    let envelope: serde_json::Value = serde_json::from_slice(&record.payload).unwrap_or_default();
    let field = |key: &str| -> String {
        envelope
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN)
            .to_string()
    };
    (record.key.clone(), field(META_ERROR), field(META_TIMESTAMP))
}

/// Passive consumer of the DLQ topic (§4.6): logs a `WARN` per record
/// and nothing more. There is no reprocessing or alerting path — an
/// operator inspects the DLQ out of band.
#[derive(Debug)]
pub struct DlqInspector {
    bus: Arc<dyn crate::core::BusReading>,
    consumer_group: &'static str,
}

impl DlqInspector {
    pub fn new(bus: Arc<dyn crate::core::BusReading>, consumer_group: &'static str) -> Self {
        Self { bus, consumer_group }
    }

    /// Runs forever, polling the DLQ topic and warning about whatever
    /// it finds.
    pub async fn run(&self) -> ! {
        loop {
            if let Err(err) = self.run_once().await {
                warn!(error = %err, "dlq inspector failed to poll");
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
        }
    }

    /// Polls once; split out for tests.
    pub async fn run_once(&self) -> Result<usize, crate::core::BusError> {
        let batch = self
            .bus
            .poll_batch(
                TOPIC_LOGS_DLQ,
                self.consumer_group,
                100,
                std::time::Duration::from_millis(500),
            )
            .await?;
        for record in &batch {
            let (service_id, dlq_error, dlq_timestamp) = decode_for_logging(record);
            warn!(
                service_id = %service_id,
                dlq_error = %dlq_error,
                dlq_timestamp = %dlq_timestamp,
                partition = record.partition,
                offset = record.offset,
                "dead-lettered record observed"
            );
        }
        Ok(batch.len())
    }
}
