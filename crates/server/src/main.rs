//! HTTP service for teacher guide generation and PDF export.

mod app;
mod demo;
mod error;

use anyhow::{Context, Result};
use app::{router, AppState};
use clap::Parser;
use guide_llm::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use guide_llm::{GeminiClient, GeminiConfig, GuideGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Serve `/demo`, `/upload` and `/export-pdf`.
#[derive(Parser, Debug)]
#[command(name = "guide-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "GUIDE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "GUIDE_PORT", default_value = "8000")]
    port: u16,

    /// Largest accepted request body, in megabytes
    #[arg(long, env = "GUIDE_MAX_UPLOAD_MB", default_value = "50")]
    max_upload_mb: usize,

    /// Gemini API key; uploads fail until one is set
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout for Gemini calls, in seconds
    #[arg(long, env = "GEMINI_TIMEOUT_SECS", default_value = "120")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads the environment.
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let generator = build_generator(&args)?;
    let state = AppState::new(generator, args.max_upload_mb * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("Shut down");
    Ok(())
}

fn build_generator(args: &Args) -> Result<Option<Arc<dyn GuideGenerator>>> {
    let api_key = match args.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            log::warn!("GEMINI_API_KEY is not set; /upload will fail until it is configured");
            return Ok(None);
        }
    };

    let config = GeminiConfig::new(api_key)
        .with_model(&args.model)
        .with_base_url(&args.base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    log::info!("Using Gemini model {} at {}", config.model, config.base_url);

    let client = GeminiClient::new(config).context("Failed to create Gemini client")?;
    Ok(Some(Arc::new(client)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
