//! Ingestion and result assembly
//!
//! Ingestion is synchronous CPU work plus one store write; it never waits on
//! enrichment. Result queries pair the ranked addresses with whatever the
//! enrichment cache knows at that moment.

use serde::Serialize;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::analysis::{
    Analysis, AnalysisId, ParseFailure, RankedItem, StatusDistribution, StreamAggregator,
};
use crate::enrichment::{AddressInfo, EnrichmentReader, PendingWorkQueue};
use crate::error::AnalysisError;
use crate::parser::{parse_event, RowSource};
use crate::storage::AnalysisStore;

/// Addresses offered for enrichment right after ingestion
pub const DEFAULT_EAGER_TOP_N: usize = 10;

/// A ranked client address with its current enrichment state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAddress {
    pub address: String,
    pub count: u64,
    pub percentage: f64,
    pub info: AddressInfo,
}

/// Everything a result query returns for one analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: AnalysisId,
    pub created_at: i64,
    pub total_requests: u64,
    pub status_distribution: StatusDistribution,
    pub top_paths: Vec<RankedItem>,
    pub top_status_codes: Vec<RankedItem>,
    pub top_addresses: Vec<RankedAddress>,
    pub parse_error_count: u64,
    pub parse_error_samples: Vec<ParseFailure>,
}

#[derive(Clone)]
pub struct AnalysisOrchestrator {
    store: Arc<dyn AnalysisStore>,
    reader: EnrichmentReader,
    queue: Arc<PendingWorkQueue<String>>,
    eager_top_n: usize,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        reader: EnrichmentReader,
        queue: Arc<PendingWorkQueue<String>>,
        eager_top_n: usize,
    ) -> Self {
        Self {
            store,
            reader,
            queue,
            eager_top_n,
        }
    }

    /// Fold every row of `input` into a fresh analysis
    ///
    /// Rows that fail validation are recorded and skipped. A read failure
    /// aborts the whole batch.
    pub fn aggregate<R: BufRead>(input: R) -> Result<Analysis, AnalysisError> {
        let mut aggregator = StreamAggregator::new();

        for row in RowSource::new(input) {
            let row = row?;
            match parse_event(&row) {
                Ok(event) => aggregator.accumulate(&event),
                Err(e) => {
                    debug!(line = row.line_number, error = %e, "Skipping invalid row");
                    aggregator.record_error(row.line_number, &row.raw, &e.to_string());
                }
            }
        }

        Ok(aggregator.finish())
    }

    /// Aggregate and persist a batch, then queue its busiest addresses
    ///
    /// Aggregation runs on the blocking pool so large uploads do not hold up
    /// other tasks on the calling worker thread.
    pub async fn ingest<R>(&self, input: R) -> Result<Arc<Analysis>, AnalysisError>
    where
        R: BufRead + Send + 'static,
    {
        let started = Instant::now();
        let analysis = tokio::task::spawn_blocking(move || Self::aggregate(input))
            .await
            .map_err(|e| {
                AnalysisError::Storage(anyhow::anyhow!("aggregation task failed: {}", e))
            })??;

        let saved = self.store.save(analysis).await.map_err(|e| {
            error!(error = %e, "Failed to save analysis");
            AnalysisError::Storage(e)
        })?;
        let id = saved.id().ok_or_else(|| {
            AnalysisError::Storage(anyhow::anyhow!("store returned an analysis without an id"))
        })?;

        let queued = self.queue.offer_all(
            saved
                .top_addresses(self.eager_top_n)
                .into_iter()
                .map(|item| item.value),
        );

        if saved.parse_error_count() > 0 {
            warn!(
                analysis_id = id,
                parse_errors = saved.parse_error_count(),
                "Ingested batch contained invalid rows"
            );
        }
        info!(
            analysis_id = id,
            total_requests = saved.total_requests(),
            queued_addresses = queued,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis ingested"
        );

        Ok(saved)
    }

    /// Assemble the top `top_n` rankings for a stored analysis
    ///
    /// Addresses not yet enriched come back as unknown and are queued.
    pub async fn get_result(
        &self,
        id: AnalysisId,
        top_n: usize,
    ) -> Result<AnalysisResult, AnalysisError> {
        let analysis = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AnalysisError::NotFound(id))?;

        let ranked = analysis.top_addresses(top_n);
        let addresses: Vec<&str> = ranked.iter().map(|item| item.value.as_str()).collect();
        let mut infos = self.reader.read_all(addresses).await;

        let top_addresses = ranked
            .into_iter()
            .map(|item| {
                let info = infos
                    .remove(&item.value)
                    .unwrap_or_else(|| AddressInfo::unknown(item.value.as_str()));
                RankedAddress {
                    address: item.value,
                    count: item.count,
                    percentage: item.percentage,
                    info,
                }
            })
            .collect();

        Ok(AnalysisResult {
            analysis_id: id,
            created_at: analysis.created_at(),
            total_requests: analysis.total_requests(),
            status_distribution: analysis.status_distribution(),
            top_paths: analysis.top_paths(top_n),
            top_status_codes: analysis.top_status_codes(top_n),
            top_addresses,
            parse_error_count: analysis.parse_error_count(),
            parse_error_samples: analysis.parse_error_samples().to_vec(),
        })
    }
}
