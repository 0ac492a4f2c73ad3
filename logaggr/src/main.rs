//! Binary entry point: wires the bus, relational store, search store,
//! cache, ingestion pipeline, and admin HTTP surface together (§2a, §6).
//!
//! Construct the concrete backends behind their traits, build the
//! domain types on top of `Arc<dyn Trait>` handles, spawn the
//! long-running loops as tasks, then block on the admin surface.

mod config;

use std::sync::Arc;

use clap::Parser;
use logaggr_bus::{
    BatchConsumer, BatchConsumerConfig, DlqErrorHandler, DlqInspector, KafkaBus, Producer,
    CONSUMER_GROUP_DLQ_INSPECTOR, CONSUMER_GROUP_LOG_PROCESSOR,
};
use logaggr_cache::{CachedSearch, RedisCache};
use logaggr_catalog::PgRelationalStore;
use logaggr_ingest::IngestPipeline;
use logaggr_metric::Registry;
use logaggr_search_service::SearchService;
use logaggr_search_store::ElasticsearchStore;
use logaggr_time::SystemProvider;
use tracing::{error, info};

use config::Config;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("bus error: {0}")]
    Bus(#[from] logaggr_bus::core::BusError),
    #[error("relational store error: {0}")]
    Catalog(#[from] logaggr_catalog::CatalogError),
    #[error("search store error: {0}")]
    SearchStore(#[from] logaggr_search_store::SearchStoreError),
    #[error("cache error: {0}")]
    Cache(#[from] logaggr_cache::CacheError),
    #[error("admin server error: {0}")]
    Admin(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::parse();
    logaggr_observability::init_logging(config.server.log_json);

    if let Err(err) = run(config).await {
        error!(error = %err, "logaggr exited with an error");
        return Err(err.into());
    }
    Ok(())
}

async fn run(config: Config) -> Result<(), StartupError> {
    let metrics = Registry::new();
    let clock = Arc::new(SystemProvider::new());

    let bus = Arc::new(KafkaBus::new(config.bus.bootstrap_servers.clone())?);

    let relational = Arc::new(PgRelationalStore::connect(&config.relational_store.database_url).await?);
    let search_store = Arc::new(ElasticsearchStore::new(&config.search_store.search_url)?);

    let cache: Option<Arc<dyn logaggr_cache::SearchCache>> = match &config.cache.cache_url {
        Some(url) => {
            info!(url, "connecting to search cache");
            Some(Arc::new(RedisCache::connect(url).await?) as Arc<dyn logaggr_cache::SearchCache>)
        }
        None => {
            info!("no cache URL configured; search results will not be cached");
            None
        }
    };

    let search_service = Arc::new(SearchService::new(search_store.clone()));
    let _cached_search = Arc::new(CachedSearch::new(search_service, cache));

    let pipeline = Arc::new(IngestPipeline::new(relational, search_store));
    let dlq = Arc::new(DlqErrorHandler::new(bus.clone(), metrics.clone(), clock.clone()));
    let consumer = BatchConsumer::new(
        bus.clone(),
        pipeline,
        dlq,
        metrics.clone(),
        BatchConsumerConfig {
            max_batch_size: config.bus.consumer_max_batch_size,
            linger: config.bus.consumer_linger(),
        },
        CONSUMER_GROUP_LOG_PROCESSOR,
    );

    let _producer = Producer::new(bus.clone(), metrics.clone());

    tokio::spawn(async move {
        consumer.run().await;
    });

    if config.bus.enable_dlq_inspector {
        let inspector = DlqInspector::new(bus.clone(), CONSUMER_GROUP_DLQ_INSPECTOR);
        tokio::spawn(async move {
            inspector.run().await;
        });
        info!("dlq inspector enabled");
    }

    let admin_state = logaggr_admin::AdminState {
        metrics,
        bus_admin: bus,
        clock,
    };
    logaggr_admin::serve(admin_state, config.server.admin_bind_addr).await?;

    Ok(())
}
