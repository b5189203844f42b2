//! Component wiring shared by the server and the CLI

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, DatabaseBackend, DatabaseConfig, LookupBackend, LookupConfig};
use crate::enrichment::{
    AddressLookup, EnrichmentCache, EnrichmentReader, EnrichmentWorker, IpInfoClient,
    MaxMindLookup, PendingWorkQueue, RetryingLookupClient, WorkerHandle,
};
use crate::orchestrator::AnalysisOrchestrator;
use crate::storage::{AnalysisStore, MemoryAnalysisStore, SqliteAnalysisStore};

/// A running pipeline: orchestrator plus the worker feeding its cache
pub struct App {
    pub orchestrator: AnalysisOrchestrator,
    pub queue: Arc<PendingWorkQueue<String>>,
    pub worker: WorkerHandle,
}

impl App {
    /// Build every component from configuration and start the worker
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(&config.database).await?;
        let lookup = open_lookup(&config.lookup)?;
        Ok(Self::start(store, lookup, config))
    }

    /// Wire an already-initialized store and lookup backend
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        store: Arc<dyn AnalysisStore>,
        lookup: Arc<dyn AddressLookup>,
        config: &Config,
    ) -> Self {
        let client = Arc::new(RetryingLookupClient::new(lookup, config.retry.policy()));
        let cache = EnrichmentCache::new(config.cache.max_size, config.cache.ttl());
        let queue = Arc::new(PendingWorkQueue::new());

        let worker =
            EnrichmentWorker::new(Arc::clone(&queue), cache.clone(), Arc::clone(&client)).spawn();

        let reader = EnrichmentReader::new(cache, Arc::clone(&queue));
        let orchestrator = AnalysisOrchestrator::new(
            store,
            reader,
            Arc::clone(&queue),
            config.analysis.eager_top_n,
        );

        Self {
            orchestrator,
            queue,
            worker,
        }
    }

    /// Wait until nothing is queued or in flight, or `timeout` elapses
    ///
    /// Returns whether the queue drained.
    pub async fn wait_for_enrichment(&self, timeout: Duration) -> bool {
        let drained = tokio::time::timeout(timeout, async {
            while self.queue.pending_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        drained.is_ok()
    }

    /// Stop the worker, abandoning anything still queued
    pub async fn shutdown(self) {
        self.worker.shutdown().await;
    }
}

pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn AnalysisStore>> {
    let store: Arc<dyn AnalysisStore> = match config.backend {
        DatabaseBackend::Memory => {
            info!("Using in-memory analysis store");
            Arc::new(MemoryAnalysisStore::new())
        }
        DatabaseBackend::Sqlite => {
            info!("Using SQLite analysis store: {}", config.url);
            Arc::new(
                SqliteAnalysisStore::new(&config.url, config.max_connections)
                    .await
                    .with_context(|| format!("Failed to open database {}", config.url))?,
            )
        }
    };

    store.init().await.context("Failed to initialize analysis store")?;
    Ok(store)
}

pub fn open_lookup(config: &LookupConfig) -> Result<Arc<dyn AddressLookup>> {
    match config.backend {
        LookupBackend::IpInfo => {
            info!("Using ipinfo lookups against {}", config.base_url);
            Ok(Arc::new(IpInfoClient::from_config(config)?))
        }
        LookupBackend::MaxMind => {
            if config.city_db.is_none() && config.asn_db.is_none() {
                anyhow::bail!("LOOKUP_BACKEND=maxmind requires GEOIP_CITY_DB or GEOIP_ASN_DB");
            }
            info!(
                city_db = ?config.city_db,
                asn_db = ?config.asn_db,
                "Using MaxMind offline lookups"
            );
            Ok(Arc::new(MaxMindLookup::new(
                config.city_db.as_deref(),
                config.asn_db.as_deref(),
            )?))
        }
    }
}
