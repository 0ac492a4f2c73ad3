//! Canonical log entry model, validation, and search DTOs (§3).
//!
//! Plain, serde-friendly structs with validation as inherent methods
//! rather than a derive macro. Each field carries both a storage
//! representation and a query-time treatment (keyword vs. analyzed
//! text), which [`crate::entry::LogDocument`]'s doc comments describe
//! even though the concrete field mapping lives in `logaggr-search-store`.

mod entry;
mod level;
mod metadata;
mod search;

pub use entry::{LogDocument, LogEntry, LogEntryRequest, ValidationError, MAX_MESSAGE_LEN, MAX_SERVICE_ID_LEN};
pub use level::{LogLevel, ParseLogLevelError};
pub use metadata::{Metadata, MetadataValue};
pub use search::{
    LogEntryResponse, LogSearchRequest, LogSearchResponse, NormalizedPage, SearchValidationError,
    DEFAULT_PAGE, DEFAULT_SIZE, MAX_SIZE,
};
