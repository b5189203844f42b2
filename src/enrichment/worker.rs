//! Background consumer of the pending address queue
//!
//! Exactly one worker drains the queue. Together with the queue's pending set
//! this keeps at most one lookup in flight per address. Running several
//! workers would additionally need a per-address claim on the cache.
//!
//! Per address: offered -> taken -> resolved and cached (known or unknown)
//! -> marked completed -> offered again once the cache entry expires.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::enrichment::cache::EnrichmentCache;
use crate::enrichment::models::AddressInfo;
use crate::enrichment::queue::PendingWorkQueue;
use crate::enrichment::retry::RetryingLookupClient;

pub struct EnrichmentWorker {
    queue: Arc<PendingWorkQueue<String>>,
    cache: EnrichmentCache,
    client: Arc<RetryingLookupClient>,
}

impl EnrichmentWorker {
    pub fn new(
        queue: Arc<PendingWorkQueue<String>>,
        cache: EnrichmentCache,
        client: Arc<RetryingLookupClient>,
    ) -> Self {
        Self {
            queue,
            cache,
            client,
        }
    }

    /// Start the worker loop on its own task
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join_handle = tokio::spawn(self.run(shutdown_rx));
        info!("Enrichment worker started");

        WorkerHandle {
            shutdown_tx,
            join_handle,
        }
    }

    /// Take and resolve addresses until shutdown is signalled
    ///
    /// Addresses still queued at shutdown are abandoned without being
    /// resolved or marked completed.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        // Handle dropped without an explicit shutdown
                        break;
                    }
                }
                address = self.queue.take() => {
                    self.process(address).await;
                }
            }
        }

        info!(
            abandoned = self.queue.size(),
            "Enrichment worker stopped"
        );
    }

    /// Resolve one taken address, cache the outcome and release it
    pub async fn process(&self, address: String) {
        if self.cache.get(&address).await.is_some() {
            debug!(address = %address, "Address already cached, skipping lookup");
        } else {
            let info = self.resolve(&address).await;
            if info.is_unknown() {
                debug!(address = %address, "Caching unknown address");
            } else {
                debug!(address = %address, country = ?info.country, "Address resolved");
            }
            self.cache.put(address.clone(), info).await;
        }

        self.queue.mark_completed(&address);
    }

    /// Run the lookup on its own task so a panic degrades to unknown
    async fn resolve(&self, address: &str) -> AddressInfo {
        let client = Arc::clone(&self.client);
        let owned = address.to_string();

        match tokio::spawn(async move { client.resolve(&owned).await }).await {
            Ok(info) => info,
            Err(e) => {
                warn!(address, error = %e, "Address lookup task failed");
                AddressInfo::unknown(address)
            }
        }
    }
}

/// Handle for stopping a spawned [`EnrichmentWorker`]
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for it to finish the current address
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join_handle.await {
            warn!(error = %e, "Enrichment worker task ended abnormally");
        }
    }
}
