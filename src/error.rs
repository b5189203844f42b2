use thiserror::Error;

use crate::analysis::AnalysisId;

/// Errors surfaced by ingestion and result queries
///
/// Row parse failures never appear here; they are recorded on the analysis.
/// Lookup failures never appear here either; they degrade to "unknown".
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The uploaded bytes could not be read; fatal for the whole batch
    #[error("failed to read log batch: {0}")]
    BatchRead(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("analysis {0} not found")]
    NotFound(AnalysisId),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::BatchRead(_) => "E1001",
            Self::Validation(_) => "E1000",
            Self::NotFound(_) => "E2000",
            Self::Storage(_) => "E500",
        }
    }
}
