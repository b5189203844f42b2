use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::analysis::{Analysis, AnalysisId};

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Persist an analysis, assigning the next identity if it has none
    ///
    /// An analysis that already carries an identity replaces the stored one.
    async fn save(&self, analysis: Analysis) -> Result<Arc<Analysis>>;

    /// Get an analysis by identity
    async fn find_by_id(&self, id: AnalysisId) -> Result<Option<Arc<Analysis>>>;
}
