//! Partitioned bus abstraction used across the ingestion pipeline (§4).
//!
//! Split transport-agnostic from transport-specific:
//! a transport-agnostic [`core`] module defining the traits, a real
//! [`kafka`] backend, and a [`mock`] in-memory backend for tests.
//! [`producer`], [`consumer`], and [`dlq`] build the ingestion-facing
//! API (`Producer`, `BatchConsumer`, `DlqErrorHandler`, `DlqInspector`)
//! on top of those traits.

pub mod consumer;
pub mod core;
pub mod dlq;
pub mod kafka;
pub mod mock;
pub mod producer;

pub use consumer::{BatchConsumer, BatchConsumerConfig, BatchOutcome};
pub use core::{
    Bus, BusAdmin, BusError, BusReading, BusRecord, BusWriting, ClusterHealth, DlqCause,
    BatchRecordHandler, CONSUMER_GROUP_DLQ_INSPECTOR, CONSUMER_GROUP_LOG_PROCESSOR, TOPIC_LOGS,
    TOPIC_LOGS_DLQ,
};
pub use dlq::{DlqErrorHandler, DlqInspector};
pub use kafka::KafkaBus;
pub use producer::Producer;
