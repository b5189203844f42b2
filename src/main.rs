use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use logscope::api;
use logscope::app::App;
use logscope::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logscope=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let app = App::from_config(&config).await?;
    info!(
        cache_max_size = config.cache.max_size,
        cache_ttl_minutes = config.cache.ttl_minutes,
        retry_attempts = config.retry.max_attempts,
        "Enrichment pipeline started"
    );

    let router = api::create_api_router(app.orchestrator.clone(), config.analysis.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Log analysis server listening on http://{}", addr);
    info!("   - Upload logs with POST http://{}/api/logs/analyze", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down enrichment worker");
    app.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
