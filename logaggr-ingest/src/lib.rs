//! Ingest pipeline (§4.3): relational persist, search index, wired as
//! the [`BatchRecordHandler`](logaggr_bus::BatchRecordHandler) the
//! consumer dispatches to.
//!
//! A single type owns `Arc<dyn Trait>` handles to both backing stores,
//! composed behind the generic bus-facing trait rather than the bus
//! crate knowing anything about Postgres or Elasticsearch.

mod error;
mod pipeline;

pub use error::IngestError;
pub use pipeline::IngestPipeline;
