//! # News Lookup
//!
//! A small HTTP service that finds recent web coverage of a news snippet.
//! Given a snippet and a category it searches DuckDuckGo, fetches the top
//! few hits, and returns a headline, description and publication date for
//! each, newest first.
//!
//! ## Usage
//!
//! ```sh
//! news_lookup --port 10000 --allowed-origin https://frontend.example
//!
//! curl -X POST localhost:10000/api/analyze \
//!      -H 'content-type: application/json' \
//!      -d '{"news_text": "RBI holds repo rate", "category": "finance"}'
//! ```
//!
//! ## Architecture
//!
//! Each `POST /api/analyze` runs the same pipeline:
//! 1. **Validation**: Reject unknown categories before touching the network
//! 2. **Searching**: One DuckDuckGo query yields up to six candidate links
//! 3. **Fetching**: The first four candidates are fetched concurrently
//! 4. **Ranking**: Successful pages are sorted newest first and cut to five
//!
//! With `--llm-url` set, `POST /api/verify` runs the same pipeline and asks
//! an OpenAI-compatible model to score the snippet against the results.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod models;
mod pipeline;
mod scrapers;
mod utils;
mod verify;

use cli::Cli;
use config::Settings;
use scrapers::{WebScraper, build_client};
use verify::LlmClient;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_lookup starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match Settings::resolve(&args).await {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        host = %settings.host,
        port = settings.port,
        allowed_origin = %settings.allowed_origin,
        timeout_secs = settings.timeout_secs,
        "Resolved configuration"
    );

    // ---- Shared HTTP client & router ----
    let client = build_client(settings.timeout())?;
    let scraper = Arc::new(WebScraper::new(client, settings.search_url.clone()));
    info!(search_url = %scraper.search_url(), "Search client ready");

    let llm = match &settings.llm_url {
        Some(llm_url) => {
            let llm = LlmClient::new(
                llm_url.clone(),
                settings.llm_model.clone(),
                settings.llm_api_key.clone(),
                settings.llm_timeout(),
            )?;
            info!(%llm_url, model = %llm.model(), "Verification enabled");
            Some(Arc::new(llm))
        }
        None => {
            info!("No llm_url configured; /api/verify disabled");
            None
        }
    };

    let app = api::router(scraper, llm, settings.allowed_origin_header()?);

    // ---- Serve ----
    let listener = match tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await
    {
        Ok(listener) => listener,
        Err(e) => {
            error!(host = %settings.host, port = settings.port, error = %e, "Failed to bind");
            return Err(e.into());
        }
    };
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C so in-flight requests can finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
