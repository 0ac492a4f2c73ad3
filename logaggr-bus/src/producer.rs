//! Publish side of the ingestion pipeline (§4.1).

use std::sync::Arc;

use logaggr_metric::{names, Registry};
use logaggr_types::LogEntryRequest;
use tracing::error;

use crate::core::{BusError, BusWriting, TOPIC_LOGS};

/// Serializes and publishes validated requests, keyed by `service_id` so
/// all of a service's logs land on the same partition (§4.1 point 3).
#[derive(Debug, Clone)]
pub struct Producer {
    bus: Arc<dyn BusWriting>,
    metrics: Registry,
}

impl Producer {
    pub fn new(bus: Arc<dyn BusWriting>, metrics: Registry) -> Self {
        Self { bus, metrics }
    }

    /// Publish one already-validated request. Callers are expected to
    /// have run [`LogEntryRequest::validate`](logaggr_types::LogEntryRequest::validate)
    /// first; this method does not re-check it.
    pub async fn send(&self, request: &LogEntryRequest) -> Result<(), BusError> {
        let result = self.send_inner(request).await;
        if let Err(err) = &result {
            error!(
                error = %err,
                service_id = %request.service_id,
                trace_id = request.trace_id.as_deref().unwrap_or(""),
                "failed to publish log entry"
            );
        }
        result
    }

    /// Publish each request in order, returning the first error
    /// encountered (if any) rather than aborting the whole batch — the
    /// caller decides whether a partial publish is acceptable.
    pub async fn send_batch(&self, requests: &[LogEntryRequest]) -> Result<(), BusError> {
        for request in requests {
            self.send(request).await?;
        }
        Ok(())
    }

    async fn send_inner(&self, request: &LogEntryRequest) -> Result<(), BusError> {
        let payload = serde_json::to_vec(request)?;
        self.bus
            .send(TOPIC_LOGS, &request.service_id, payload)
            .await?;
        self.metrics.counter(names::LOGS_PUBLISHED_TOTAL).inc(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;
    use logaggr_time::{SystemProvider, TimeProvider};
    use logaggr_types::LogLevel;

    fn sample_request() -> LogEntryRequest {
        LogEntryRequest {
            timestamp: SystemProvider::new().now(),
            service_id: "checkout".into(),
            level: LogLevel::Info,
            message: "order placed".into(),
            metadata: None,
            trace_id: None,
        }
    }

    #[tokio::test]
    async fn send_publishes_and_counts() {
        let bus = Arc::new(MockBus::new());
        let metrics = Registry::new();
        let producer = Producer::new(bus.clone(), metrics.clone());

        producer.send(&sample_request()).await.unwrap();

        assert_eq!(metrics.counter(names::LOGS_PUBLISHED_TOTAL).get(), 1);
        assert_eq!(bus.topic_len(TOPIC_LOGS), 1);
    }

    #[tokio::test]
    async fn send_batch_publishes_every_request() {
        let bus = Arc::new(MockBus::new());
        let metrics = Registry::new();
        let producer = Producer::new(bus.clone(), metrics.clone());

        let requests = vec![sample_request(), sample_request(), sample_request()];
        producer.send_batch(&requests).await.unwrap();

        assert_eq!(metrics.counter(names::LOGS_PUBLISHED_TOTAL).get(), 3);
        assert_eq!(bus.topic_len(TOPIC_LOGS), 3);
    }
}
