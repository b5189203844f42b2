use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analysis::{Analysis, AnalysisId};
use crate::storage::AnalysisStore;

/// Process-local store; identities start at 1
#[derive(Default)]
pub struct MemoryAnalysisStore {
    analyses: DashMap<AnalysisId, Arc<Analysis>>,
    last_id: AtomicU64,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn save(&self, analysis: Analysis) -> Result<Arc<Analysis>> {
        let analysis = match analysis.id() {
            Some(_) => analysis,
            None => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                analysis.with_id(id)
            }
        };

        let id = analysis.id().unwrap_or_default();
        let saved = Arc::new(analysis);
        self.analyses.insert(id, Arc::clone(&saved));
        Ok(saved)
    }

    async fn find_by_id(&self, id: AnalysisId) -> Result<Option<Arc<Analysis>>> {
        Ok(self.analyses.get(&id).map(|entry| Arc::clone(entry.value())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StreamAggregator;

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = MemoryAnalysisStore::new();

        let first = store.save(StreamAggregator::new().finish()).await.unwrap();
        let second = store.save(StreamAggregator::new().finish()).await.unwrap();

        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_save_keeps_existing_id() {
        let store = MemoryAnalysisStore::new();
        let saved = store
            .save(StreamAggregator::new().finish().with_id(41))
            .await
            .unwrap();

        assert_eq!(saved.id(), Some(41));
        assert!(store.find_by_id(41).await.unwrap().is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = MemoryAnalysisStore::new();
        assert!(store.find_by_id(99).await.unwrap().is_none());
    }
}
