use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::enrichment::cache::EnrichmentCache;
use crate::enrichment::models::AddressInfo;
use crate::enrichment::queue::PendingWorkQueue;

/// Synchronous read path for address metadata
///
/// Serves cached values and queues misses for the background worker. Never
/// waits on a lookup: a miss returns the unknown sentinel immediately.
#[derive(Clone)]
pub struct EnrichmentReader {
    cache: EnrichmentCache,
    queue: Arc<PendingWorkQueue<String>>,
}

impl EnrichmentReader {
    pub fn new(cache: EnrichmentCache, queue: Arc<PendingWorkQueue<String>>) -> Self {
        Self { cache, queue }
    }

    pub async fn read(&self, address: &str) -> AddressInfo {
        if let Some(info) = self.cache.get(address).await {
            debug!(address, "Enrichment cache hit");
            return info;
        }

        if self.queue.offer(address.to_string()) {
            debug!(address, "Enrichment cache miss, queued for lookup");
        } else {
            debug!(address, "Enrichment cache miss, lookup already pending");
        }

        AddressInfo::unknown(address)
    }

    /// Read each distinct address once
    pub async fn read_all<I, S>(&self, addresses: I) -> HashMap<String, AddressInfo>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = HashMap::new();
        for address in addresses {
            let address = address.as_ref();
            if result.contains_key(address) {
                continue;
            }
            let info = self.read(address).await;
            result.insert(address.to_string(), info);
        }
        result
    }
}
