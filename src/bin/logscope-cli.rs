use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logscope::api::response::AnalysisResultResponse;
use logscope::app::App;
use logscope::config::Config;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logscope-cli")]
#[command(about = "Analyze access log files from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a log file and print the result as JSON
    Analyze {
        /// Comma-separated access log with a header line
        file: PathBuf,
        /// Number of entries per ranking
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        top: u64,
        /// How long to wait for address enrichment before printing
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logscope=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Analyze { file, top, wait_ms } => {
            let app = App::from_config(&config).await?;

            let input = File::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let analysis = app.orchestrator.ingest(BufReader::new(input)).await?;
            let id = analysis.id().context("Stored analysis has no id")?;

            if wait_ms > 0 {
                // Rankings beyond the eager set are only queued on first read
                app.orchestrator.get_result(id, top as usize).await?;
                if !app.wait_for_enrichment(Duration::from_millis(wait_ms)).await {
                    eprintln!("⚠ Enrichment still pending after {} ms", wait_ms);
                }
            }

            let result = app.orchestrator.get_result(id, top as usize).await?;
            let body = serde_json::to_string_pretty(&AnalysisResultResponse::from(result))?;
            println!("{}", body);

            app.shutdown().await;
        }
    }

    Ok(())
}
