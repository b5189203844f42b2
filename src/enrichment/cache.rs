use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::time::Duration;

use crate::enrichment::models::AddressInfo;

/// Address metadata cache bounded by entry count and a fixed time-to-live
///
/// Entries expire a fixed time after they were written regardless of how
/// often they are read. Once full, the least recently used entry is evicted.
/// Cloning shares the underlying store.
#[derive(Clone)]
pub struct EnrichmentCache {
    inner: Cache<String, AddressInfo>,
}

impl EnrichmentCache {
    pub const DEFAULT_MAX_SIZE: u64 = 1000;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new(max_size: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_size)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { inner }
    }

    pub async fn get(&self, address: &str) -> Option<AddressInfo> {
        self.inner.get(address).await
    }

    /// Insert or overwrite; restarts the entry's TTL
    pub async fn put(&self, address: String, info: AddressInfo) {
        self.inner.insert(address, info).await;
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Apply pending evictions and expirations now
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for EnrichmentCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZE, Self::DEFAULT_TTL)
    }
}
