//! Criteria application, paginated search, sampled aggregation, and DTO
//! mapping (§4.7, §4.8, §4.11).
//!
//! A single service type holds an `Arc<dyn Trait>` to its backing
//! store, with validation and response assembly as its own steps
//! rather than folded into the store adapter.

mod dto;
mod service;

pub use dto::to_response;
pub use service::{SearchService, SearchServiceError, AGGREGATION_SAMPLE_SIZE};
