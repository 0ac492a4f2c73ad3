use serde::{Deserialize, Serialize};

use logaggr_time::Time;

use crate::level::LogLevel;
use crate::metadata::Metadata;

pub const MAX_SERVICE_ID_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 10_000;

/// Errors produced by [`LogEntryRequest::validate`] (§3, §7 `ValidationError`).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("serviceId must not be blank")]
    ServiceIdBlank,
    #[error("serviceId must be at most {MAX_SERVICE_ID_LEN} characters, got {0}")]
    ServiceIdTooLong(usize),
    #[error("message must not be blank")]
    MessageBlank,
    #[error("message must be at most {MAX_MESSAGE_LEN} characters, got {0}")]
    MessageTooLong(usize),
}

/// Input record accepted by the [`Producer`](../logaggr_bus/struct.Producer.html)
/// (§3 `LogEntryRequest`). Validation happens at the transport boundary
/// via [`validate`](Self::validate) before anything is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryRequest {
    pub timestamp: Time,
    pub service_id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl LogEntryRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_id.trim().is_empty() {
            return Err(ValidationError::ServiceIdBlank);
        }
        if self.service_id.chars().count() > MAX_SERVICE_ID_LEN {
            return Err(ValidationError::ServiceIdTooLong(self.service_id.chars().count()));
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::MessageBlank);
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ValidationError::MessageTooLong(self.message.chars().count()));
        }
        Ok(())
    }

    pub fn metadata_or_empty(&self) -> Metadata {
        self.metadata.clone().unwrap_or_default()
    }
}

/// Persisted relational entry (§3 `LogEntry`). Write-once: no update or
/// delete path exists anywhere in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: Time,
    pub service_id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub created_at: Time,
}

impl LogEntry {
    /// Build a persisted entry from a validated request plus the
    /// identity/creation-time assigned by the relational store adapter.
    pub fn from_request(request: &LogEntryRequest, id: i64, created_at: Time) -> Self {
        Self {
            id,
            timestamp: request.timestamp,
            service_id: request.service_id.clone(),
            level: request.level,
            message: request.message.clone(),
            metadata: request.metadata.clone(),
            trace_id: request.trace_id.clone(),
            created_at,
        }
    }
}

/// Persisted search-store document (§3 `LogDocument`). `postgres_id` is
/// populated by the ingest pipeline (§4.3) once the matching relational
/// entry has been saved; it is `None` only transiently, never by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    pub id: String,
    pub timestamp: Time,
    pub service_id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub created_at: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres_id: Option<i64>,
}

impl LogDocument {
    /// Allocate a fresh search-document id (random 128-bit, string
    /// encoded — §3) for a request, initially unlinked to any
    /// relational identity.
    pub fn from_request(request: &LogEntryRequest, created_at: Time) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: request.timestamp,
            service_id: request.service_id.clone(),
            level: request.level,
            message: request.message.clone(),
            metadata: request.metadata.clone(),
            trace_id: request.trace_id.clone(),
            created_at,
            postgres_id: None,
        }
    }

    pub fn with_postgres_id(mut self, postgres_id: i64) -> Self {
        self.postgres_id = Some(postgres_id);
        self
    }
}
