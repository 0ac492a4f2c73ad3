//! Typed CLI/env configuration (§2a, §6): one small `#[derive(Parser)]`
//! struct per bounded concern, composed by [`Config`], the way
//! `clap_blocks` composes `IoxServerConfig` out of smaller structs for
//! the catalog/write-buffer/object-store each own.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct BusConfig {
    /// Comma-separated Kafka bootstrap servers (§6).
    #[clap(long = "bus-bootstrap-servers", env = "LOGAGGR_BUS_BOOTSTRAP_SERVERS")]
    pub bootstrap_servers: String,

    /// Enable the passive DLQ inspector consumer (§4.6). Disabled by
    /// default — operators turn it on via this flag or the admin
    /// surface's equivalent control.
    #[clap(long = "enable-dlq-inspector", env = "LOGAGGR_ENABLE_DLQ_INSPECTOR")]
    pub enable_dlq_inspector: bool,

    #[clap(long = "consumer-max-batch-size", env = "LOGAGGR_CONSUMER_MAX_BATCH_SIZE", default_value = "100")]
    pub consumer_max_batch_size: usize,

    #[clap(long = "consumer-linger-ms", env = "LOGAGGR_CONSUMER_LINGER_MS", default_value = "500")]
    pub consumer_linger_ms: u64,
}

impl BusConfig {
    pub fn consumer_linger(&self) -> Duration {
        Duration::from_millis(self.consumer_linger_ms)
    }
}

#[derive(Debug, Parser)]
pub struct RelationalStoreConfig {
    /// Postgres connection string (§6).
    #[clap(long = "database-url", env = "LOGAGGR_DATABASE_URL")]
    pub database_url: String,
}

#[derive(Debug, Parser)]
pub struct SearchStoreConfig {
    /// Elasticsearch endpoint (§6).
    #[clap(long = "search-url", env = "LOGAGGR_SEARCH_URL")]
    pub search_url: String,
}

#[derive(Debug, Parser)]
pub struct CacheConfig {
    /// Redis endpoint (§6). Omit to run with caching disabled — every
    /// search call falls through to the search store (§4.9 point 5).
    #[clap(long = "cache-url", env = "LOGAGGR_CACHE_URL")]
    pub cache_url: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ServerConfig {
    /// Admin HTTP bind address (§6).
    #[clap(long = "admin-bind-addr", env = "LOGAGGR_ADMIN_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub admin_bind_addr: SocketAddr,

    /// Emit logs as JSON instead of the human-readable format.
    #[clap(long = "log-json", env = "LOGAGGR_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Parser)]
#[clap(name = "logaggr", about = "Log aggregation pipeline: ingest, index, and cached search")]
pub struct Config {
    #[clap(flatten)]
    pub bus: BusConfig,

    #[clap(flatten)]
    pub relational_store: RelationalStoreConfig,

    #[clap(flatten)]
    pub search_store: SearchStoreConfig,

    #[clap(flatten)]
    pub cache: CacheConfig,

    #[clap(flatten)]
    pub server: ServerConfig,
}
