use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;

use crate::analysis::AnalysisId;
use crate::error::AnalysisError;
use crate::orchestrator::AnalysisOrchestrator;

use super::response::{AnalysisResultResponse, AnalysisSummary, ApiError, ApiResponse};

/// Multipart part carrying the log file
const FILE_FIELD: &str = "file";

pub struct AppState {
    pub orchestrator: AnalysisOrchestrator,
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    #[serde(rename = "topN", default = "default_top_n")]
    pub top_n: i64,
}

fn default_top_n() -> i64 {
    10
}

pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::empty())
}

/// Analyze an uploaded log file
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("invalid multipart body: {}", e.body_text())))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field.bytes().await.map_err(|e| {
                ApiError(AnalysisError::BatchRead(std::io::Error::other(e.body_text())))
            })?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload
        .ok_or_else(|| ApiError::validation(format!("missing multipart part '{}'", FILE_FIELD)))?;

    let analysis = state.orchestrator.ingest(Cursor::new(bytes)).await?;
    let id = analysis
        .id()
        .ok_or_else(|| ApiError(AnalysisError::Storage(anyhow::anyhow!("analysis has no id"))))?;

    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, format!("/api/logs/analysis/{}", id))],
        Json(ApiResponse::success(AnalysisSummary::new(id, &analysis))),
    ))
}

/// Ranked results for a stored analysis, enriched with whatever is cached
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    path: Result<Path<AnalysisId>, PathRejection>,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<AnalysisResultResponse>>, ApiError> {
    let Path(id) = path
        .map_err(|e| ApiError::validation(format!("invalid analysis id: {}", e.body_text())))?;
    let Query(query) = query
        .map_err(|e| ApiError::validation(format!("invalid query: {}", e.body_text())))?;

    if query.top_n < 1 {
        return Err(ApiError::validation(format!(
            "topN must be at least 1, got {}",
            query.top_n
        )));
    }

    let result = state
        .orchestrator
        .get_result(id, query.top_n as usize)
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}
