//! Bus trait abstraction and error taxonomy.
//!
//! [`BusWriting`], [`BusReading`], and [`BusAdmin`] are kept as
//! separate traits so a component only depends on the capability it
//! actually needs (the `Producer` never needs to read, the
//! `DlqInspector` never needs to write). `BusError` is a "kind + boxed
//! inner error" shape, transport-agnostic by construction.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

pub const TOPIC_LOGS: &str = "logs";
pub const TOPIC_LOGS_DLQ: &str = "logs-dlq";

pub const CONSUMER_GROUP_LOG_PROCESSOR: &str = "log-processor-group";
pub const CONSUMER_GROUP_DLQ_INSPECTOR: &str = "dlq-inspector";

/// Generic boxed bus error: a small closed set of kinds plus an opaque
/// transport-level cause.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("health probe did not complete within {0:?}")]
    HealthProbeTimeout(Duration),
}

/// A record pulled off the bus, with the partition/offset headers the
/// spec requires be preserved through DLQ routing (§4.2, §4.5).
#[derive(Debug, Clone)]
pub struct BusRecord {
    pub key: String,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

/// Result of the bus health probe (§4.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterHealth {
    Up { cluster_id: String, node_count: usize },
    Down { error_class: String, message: String },
}

/// Publish side of the bus. Implemented once per concrete backend
/// (`kafka::KafkaBus` in production, `mock::MockBus` in tests).
#[async_trait]
pub trait BusWriting: Debug + Send + Sync + 'static {
    /// Publish `payload` to `topic`, partitioned by `key`. Returns once
    /// the broker has acknowledged the write (or buffering failed) —
    /// per §5 this may block briefly under backpressure but never on
    /// the full round trip.
    async fn send(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BusError>;
}

/// Consume side of the bus, scoped to a `(topic, consumer_group)` pair
/// the way a `WriteBufferStreamHandler` is scoped to one sequencer.
#[async_trait]
pub trait BusReading: Debug + Send + Sync + 'static {
    /// Pull up to `max_records` records from `topic` under `group`,
    /// waiting at most `linger` for the batch to fill. May return fewer
    /// than `max_records` (including zero) if `linger` elapses first.
    async fn poll_batch(
        &self,
        topic: &str,
        group: &str,
        max_records: usize,
        linger: Duration,
    ) -> Result<Vec<BusRecord>, BusError>;
}

/// Cluster-level operations, used only by the health probe (§4.10).
#[async_trait]
pub trait BusAdmin: Debug + Send + Sync + 'static {
    async fn describe_cluster(&self, timeout: Duration) -> Result<ClusterHealth, BusError>;
}

/// Full bus capability set. Most call sites only need one of the three
/// traits above; the binary wires up something that implements all of
/// them and hands out `Arc<dyn BusWriting>` / `Arc<dyn BusReading>` /
/// `Arc<dyn BusAdmin>` to the components that need them.
pub trait Bus: BusWriting + BusReading + BusAdmin {}
impl<T: BusWriting + BusReading + BusAdmin> Bus for T {}

/// A failure cause reported back to [`BatchConsumer`](crate::consumer::BatchConsumer)
/// by whatever processes one decoded request. Concrete request-handling
/// crates (the ingest pipeline) implement this on their own error enum;
/// `logaggr-bus` only needs enough to fill in the DLQ metadata fields
/// from §4.5, so it asks for a stable error code and a human message
/// rather than taking a dependency on the handler's error type.
pub trait DlqCause: std::fmt::Display + Send + Sync + 'static {
    /// A short, stable identifier for the failure class, used as the
    /// `dlq-error-code` metadata value. Not a localized message.
    fn error_code(&self) -> &'static str;
}

/// Deserializes and processes one decoded request. Implemented by the
/// ingest pipeline; kept as a trait here so `logaggr-bus` does not
/// depend on `logaggr-ingest` (the dependency runs the other way).
#[async_trait]
pub trait BatchRecordHandler: Debug + Send + Sync + 'static {
    async fn handle(&self, request: logaggr_types::LogEntryRequest) -> Result<(), Box<dyn DlqCause>>;
}
