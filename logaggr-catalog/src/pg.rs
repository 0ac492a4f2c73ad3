//! Postgres-backed [`RelationalStore`] (§4.4).
//!
//! A `PgPoolOptions` pool, a schema bootstrapped with
//! `CREATE TABLE IF NOT EXISTS`, and `metadata` stored as `JSONB`
//! rather than a serialized text blob so it stays queryable.
//! `trace_id` is deliberately left unindexed and non-unique per §3
//! ("production experience showed uniqueness broke tracing fan-out").

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

use logaggr_time::Time;
use logaggr_types::{LogEntry, LogEntryRequest, LogLevel, Metadata};

use crate::error::{ConnectSnafu, QuerySnafu, TransactionSnafu};
use crate::idgen::IdBlockAllocator;
use crate::{matches, CatalogError, RelationalCriteria, RelationalStore};
use snafu::ResultExt;

/// A Postgres-backed [`RelationalStore`].
#[derive(Debug)]
pub struct PgRelationalStore {
    pool: PgPool,
    ids: IdBlockAllocator,
}

impl PgRelationalStore {
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context(ConnectSnafu)?;
        Self::new(pool).await
    }

    pub async fn new(pool: PgPool) -> Result<Self, CatalogError> {
        Self::run_migrations(&pool).await?;
        let ids = IdBlockAllocator::new(pool.clone());
        Ok(Self { pool, ids })
    }

    async fn run_migrations(pool: &PgPool) -> Result<(), CatalogError> {
        sqlx::query(
            "CREATE SEQUENCE IF NOT EXISTS log_entry_id_seq INCREMENT BY 50 START WITH 1",
        )
        .execute(pool)
        .await
        .context(QuerySnafu)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log_entries (
                id BIGINT PRIMARY KEY,
                timestamp TIMESTAMPTZ NOT NULL,
                service_id TEXT NOT NULL,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                metadata JSONB,
                trace_id TEXT,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context(QuerySnafu)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_log_entries_timestamp ON log_entries (timestamp)")
            .execute(pool)
            .await
            .context(QuerySnafu)?;

        Ok(())
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<LogEntry, CatalogError> {
        let level: String = row.try_get("level").context(QuerySnafu)?;
        let metadata_json: Option<serde_json::Value> = row.try_get("metadata").context(QuerySnafu)?;
        let metadata: Option<Metadata> = metadata_json
            .map(|v| serde_json::from_value(v).unwrap_or_default());

        Ok(LogEntry {
            id: row.try_get("id").context(QuerySnafu)?,
            timestamp: Time::from_datetime(row.try_get("timestamp").context(QuerySnafu)?),
            service_id: row.try_get("service_id").context(QuerySnafu)?,
            level: level.parse().unwrap_or(LogLevel::Info),
            message: row.try_get("message").context(QuerySnafu)?,
            metadata,
            trace_id: row.try_get("trace_id").context(QuerySnafu)?,
            created_at: Time::from_datetime(row.try_get("created_at").context(QuerySnafu)?),
        })
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    async fn save(&self, request: &LogEntryRequest) -> Result<LogEntry, CatalogError> {
        let saved = self.save_all(std::slice::from_ref(request)).await?;
        Ok(saved.into_iter().next().expect("save_all returns one entry per request"))
    }

    async fn save_all(&self, requests: &[LogEntryRequest]) -> Result<Vec<LogEntry>, CatalogError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.context(TransactionSnafu)?;
        let created_at = chrono::Utc::now();
        let mut entries = Vec::with_capacity(requests.len());

        for request in requests {
            let id = self.ids.next_id().await?;
            let metadata_json = request
                .metadata
                .as_ref()
                .map(|m| serde_json::to_value(m).unwrap_or(serde_json::Value::Null));

            sqlx::query(
                r#"
                INSERT INTO log_entries
                    (id, timestamp, service_id, level, message, metadata, trace_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(id)
            .bind(request.timestamp.as_datetime())
            .bind(&request.service_id)
            .bind(request.level.as_str())
            .bind(&request.message)
            .bind(metadata_json)
            .bind(&request.trace_id)
            .bind(created_at)
            .execute(&mut tx)
            .await
            .context(QuerySnafu)?;

            entries.push(LogEntry::from_request(request, id, Time::from_datetime(created_at)));
        }

        tx.commit().await.context(TransactionSnafu)?;
        Ok(entries)
    }

    async fn find_page(
        &self,
        criteria: &RelationalCriteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogEntry>, u64), CatalogError> {
        // serviceId/level are filterable-but-not-necessarily-indexed
        // (§4.4) — applying them in Rust rather than building a
        // dynamic `WHERE` clause keeps the query static and avoids a
        // query-builder dependency for what is, at this scope, a small
        // table scan.
        let rows = sqlx::query("SELECT * FROM log_entries ORDER BY timestamp DESC")
            .fetch_all(&self.pool)
            .await
            .context(QuerySnafu)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(Self::row_to_entry(row)?);
        }
        let filtered: Vec<LogEntry> = entries.into_iter().filter(|e| matches(criteria, e)).collect();
        Ok(crate::paginate(filtered, page, size))
    }
}
