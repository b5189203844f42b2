use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::orchestrator::AnalysisOrchestrator;

use super::handlers::{analyze, get_analysis, health_check, AppState};

pub fn create_api_router(orchestrator: AnalysisOrchestrator, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let log_routes = Router::new()
        .route("/analyze", post(analyze))
        .route("/analysis/{id}", get(get_analysis))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/logs", log_routes)
        .layer(CorsLayer::permissive())
}
