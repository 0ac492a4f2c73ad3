use logaggr_bus::DlqCause;
use logaggr_catalog::CatalogError;

/// The only failure that routes a record to the DLQ (§4.3): relational
/// persistence. Search-index failures are logged but never propagated
/// here — the relational store remains authoritative (§4.3, §7
/// `IndexingFailure`).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("relational store error: {0}")]
    Relational(#[from] CatalogError),
}

impl DlqCause for IngestError {
    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Relational(_) => "relational-store-error",
        }
    }
}
