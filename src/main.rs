//! dxassist: diagnosis-support HTTP service.
//!
//! Main entry point for the API server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dxassist::adapters::llm::ChatCompletionsClient;
use dxassist::adapters::sanitize::SanitizingMakeWriter;
use dxassist::adapters::sqlite::SqliteStorage;
use dxassist::api::{self, AppState};
use dxassist::application::PredictionService;
use dxassist::ml::BoostingParams;
use dxassist::Config;

fn main() -> Result<()> {
    // Logs go to stdout unless DXASSIST_LOG_MODE=file.
    let log_mode = std::env::var("DXASSIST_LOG_MODE").unwrap_or_else(|_| "stdout".to_string());

    let (writer, _guard) = if log_mode == "file" {
        let log_file = std::env::var("DXASSIST_LOG_FILE")
            .unwrap_or_else(|_| "data/dxassist.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let config = Config::from_env();
    tracing::info!("Starting dxassist with {:?}", config);

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let storage = Arc::new(
        SqliteStorage::new(&config.db_path)
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?,
    );

    let predictions = Arc::new(PredictionService::new(&config.model_dir));
    if predictions.preload() {
        tracing::info!("Model ready");
    }

    // The blocking HTTP client owns a runtime of its own; build it before ours.
    let llm = Arc::new(
        ChatCompletionsClient::new(&config.llm).context("Failed to build narrative client")?,
    );
    if !llm.is_configured() {
        tracing::warn!("DXASSIST_LLM_API_KEY not set; narratives use the fallback template");
    }

    let state = AppState::new(
        &config,
        storage,
        predictions,
        llm.clone(),
        llm.clone(),
        BoostingParams::default(),
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(api::serve(config.bind, state))?;
    drop(runtime);

    // Last handle to the blocking client is released outside the runtime.
    drop(llm);

    tracing::info!("dxassist shutdown complete.");
    Ok(())
}
