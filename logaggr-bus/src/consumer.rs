//! Batch consumption of the `logs` topic (§4.2).

use std::sync::Arc;
use std::time::Duration;

use logaggr_metric::{names, Registry};
use logaggr_types::LogEntryRequest;
use tracing::{info, warn};

use crate::core::{BatchRecordHandler, BusError, BusReading, BusRecord, TOPIC_LOGS};
use crate::dlq::DlqErrorHandler;

/// Tuning for one `BatchConsumer::run` loop iteration (§4.2 points 1-2).
#[derive(Debug, Clone, Copy)]
pub struct BatchConsumerConfig {
    pub max_batch_size: usize,
    pub linger: Duration,
}

impl Default for BatchConsumerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            linger: Duration::from_millis(500),
        }
    }
}

/// Outcome of processing one batch, used for both the §4.2 log line and
/// as the return value tests assert against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub received: usize,
    pub succeeded: usize,
    pub routed_to_dlq: usize,
    pub elapsed: Duration,
}

/// Pulls batches off the `logs` topic, hands each decoded request to a
/// [`BatchRecordHandler`], and routes failures to the DLQ (§4.2, §4.4).
#[derive(Debug)]
pub struct BatchConsumer<H> {
    bus: Arc<dyn BusReading>,
    handler: Arc<H>,
    dlq: Arc<DlqErrorHandler>,
    metrics: Registry,
    config: BatchConsumerConfig,
    consumer_group: &'static str,
}

impl<H: BatchRecordHandler> BatchConsumer<H> {
    pub fn new(
        bus: Arc<dyn BusReading>,
        handler: Arc<H>,
        dlq: Arc<DlqErrorHandler>,
        metrics: Registry,
        config: BatchConsumerConfig,
        consumer_group: &'static str,
    ) -> Self {
        Self {
            bus,
            handler,
            dlq,
            metrics,
            config,
            consumer_group,
        }
    }

    /// Runs forever, processing one batch per iteration. The spec
    /// describes this as a continuous poll loop (§4.2 point 1); the
    /// binary is expected to spawn this as its own task.
    pub async fn run(&self) -> ! {
        loop {
            match self.process_one_batch().await {
                Ok(outcome) if outcome.received > 0 => {
                    let elapsed_secs = outcome.elapsed.as_secs_f64();
                    let throughput = if elapsed_secs > 0.0 {
                        outcome.succeeded as f64 / elapsed_secs
                    } else {
                        outcome.succeeded as f64
                    };
                    info!(
                        received = outcome.received,
                        succeeded = outcome.succeeded,
                        routed_to_dlq = outcome.routed_to_dlq,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        throughput_per_sec = throughput,
                        "processed batch"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "failed to poll batch");
                    tokio::time::sleep(self.config.linger).await;
                }
            }
        }
    }

    /// Processes exactly one batch; split out from [`Self::run`] so it
    /// can be exercised directly in tests without an infinite loop.
    pub async fn process_one_batch(&self) -> Result<BatchOutcome, BusError> {
        let timer = self.metrics.timer(names::CONSUMER_BATCH_PROCESSING_DURATION);
        let start = std::time::Instant::now();

        let batch = self
            .bus
            .poll_batch(
                TOPIC_LOGS,
                self.consumer_group,
                self.config.max_batch_size,
                self.config.linger,
            )
            .await?;

        let mut outcome = BatchOutcome {
            received: batch.len(),
            ..Default::default()
        };

        for record in &batch {
            self.process_one(record, &mut outcome).await;
        }

        self.metrics
            .counter(names::LOGS_CONSUMED_TOTAL)
            .inc(outcome.succeeded as u64);
        outcome.elapsed = start.elapsed();
        timer.record(outcome.elapsed);
        Ok(outcome)
    }

    async fn process_one(&self, record: &BusRecord, outcome: &mut BatchOutcome) {
        let request: LogEntryRequest = match serde_json::from_slice(&record.payload) {
            Ok(r) => r,
            Err(err) => {
                self.dlq
                    .route_decode_failure(record, &err.to_string())
                    .await;
                outcome.routed_to_dlq += 1;
                return;
            }
        };

        match self.handler.handle(request.clone()).await {
            Ok(()) => outcome.succeeded += 1,
            Err(cause) => {
                self.dlq.route(&request, cause.as_ref(), record).await;
                outcome.routed_to_dlq += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DlqCause;
    use crate::dlq::DlqErrorHandler;
    use crate::mock::MockBus;
    use logaggr_time::{MockProvider, SystemProvider, Time, TimeProvider};
    use logaggr_types::LogLevel;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FailOn {
        fail_service: &'static str,
        calls: AtomicUsize,
    }

    #[derive(Debug)]
    struct RejectedService;

    impl fmt::Display for RejectedService {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "service rejected")
        }
    }

    impl DlqCause for RejectedService {
        fn error_code(&self) -> &'static str {
            "rejected-service"
        }
    }

    #[async_trait::async_trait]
    impl BatchRecordHandler for FailOn {
        async fn handle(&self, request: LogEntryRequest) -> Result<(), Box<dyn DlqCause>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if request.service_id == self.fail_service {
                Err(Box::new(RejectedService))
            } else {
                Ok(())
            }
        }
    }

    fn request(service_id: &str) -> LogEntryRequest {
        LogEntryRequest {
            timestamp: SystemProvider::new().now(),
            service_id: service_id.into(),
            level: LogLevel::Info,
            message: "hello".into(),
            metadata: None,
            trace_id: None,
        }
    }

    #[tokio::test]
    async fn successful_batch_is_fully_tallied() {
        let bus = Arc::new(MockBus::new());
        for svc in ["a", "b", "c"] {
            bus.send("logs", svc, serde_json::to_vec(&request(svc)).unwrap())
                .await
                .unwrap();
        }

        let handler = Arc::new(FailOn {
            fail_service: "nonexistent",
            calls: AtomicUsize::new(0),
        });
        let dlq_bus = Arc::new(MockBus::new());
        let clock = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let dlq = Arc::new(DlqErrorHandler::new(dlq_bus.clone(), Registry::new(), clock));

        let consumer = BatchConsumer::new(
            bus,
            handler,
            dlq,
            Registry::new(),
            BatchConsumerConfig::default(),
            "log-processor-group",
        );

        let outcome = consumer.process_one_batch().await.unwrap();
        assert_eq!(outcome.received, 3);
        assert_eq!(outcome.succeeded, 3);
        assert_eq!(outcome.routed_to_dlq, 0);
    }

    #[tokio::test]
    async fn failing_handler_routes_to_dlq_and_preserves_headers() {
        let bus = Arc::new(MockBus::new());
        bus.send("logs", "bad", serde_json::to_vec(&request("bad")).unwrap())
            .await
            .unwrap();
        bus.send("logs", "good", serde_json::to_vec(&request("good")).unwrap())
            .await
            .unwrap();

        let handler = Arc::new(FailOn {
            fail_service: "bad",
            calls: AtomicUsize::new(0),
        });
        let dlq_bus = Arc::new(MockBus::new());
        let clock = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let dlq = Arc::new(DlqErrorHandler::new(dlq_bus.clone(), Registry::new(), clock));

        let consumer = BatchConsumer::new(
            bus,
            handler,
            dlq,
            Registry::new(),
            BatchConsumerConfig::default(),
            "log-processor-group",
        );

        let outcome = consumer.process_one_batch().await.unwrap();
        assert_eq!(outcome.received, 2);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.routed_to_dlq, 1);
        assert_eq!(dlq_bus.topic_len(crate::core::TOPIC_LOGS_DLQ), 1);
    }
}
