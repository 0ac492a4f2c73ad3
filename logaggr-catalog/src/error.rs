use snafu::Snafu;

/// Errors surfaced by a [`crate::RelationalStore`] implementation.
///
/// Every variant here is, per §7, a `TransientStoreError` from the
/// caller's perspective during ingest (routed to DLQ) or surfaced
/// directly during search/admin reads.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CatalogError {
    #[snafu(display("failed to acquire a connection from the pool: {source}"))]
    Connect { source: sqlx::Error },

    #[snafu(display("query failed: {source}"))]
    Query { source: sqlx::Error },

    #[snafu(display("transaction failed: {source}"))]
    Transaction { source: sqlx::Error },
}
