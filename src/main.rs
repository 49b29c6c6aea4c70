//! # Finance Digest
//!
//! Fetches recent finance news from NewsAPI, asks an OpenAI-compatible LLM
//! (DeepSeek by default) for a short macro analysis of each article, and
//! writes the results as a dated Markdown report.
//!
//! ## Usage
//!
//! ```sh
//! finance_digest --config config.yaml --mode concurrent
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: One NewsAPI search for the configured keywords, with
//!    sports coverage excluded
//! 2. **Summarizing**: Each article goes to the LLM, at most `concurrency`
//!    calls at a time; a failed call becomes a visible placeholder
//! 3. **Output**: Sections are streamed to the report as they finish
//!    (concurrent mode) or written in one go in fetch order (serial mode)

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod summarizer;
mod utils;

use api::{DeepSeekClient, LlmSettings};
use cli::{Cli, RunMode};
use config::AppConfig;
use pipeline::{ReportSettings, run_concurrent, run_serial};
use sources::newsapi::{NewsApiClient, NewsApiSettings};
use summarizer::Summarizer;
use utils::{build_http_client, ensure_writable_dir};

/// Fold command-line overrides into the loaded config.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(n) = cli.concurrency {
        config.concurrency = n;
    }
    if let Some(key) = cli.newsapi_key.as_ref().filter(|k| !k.is_empty()) {
        config.newsapi_key = key.clone();
    }
    if let Some(key) = cli.deepseek_api_key.as_ref().filter(|k| !k.is_empty()) {
        config.deepseek_api_key = key.clone();
    }
}

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

    let start_time = std::time::Instant::now();
    info!("finance_digest starting up");

    let args = Cli::parse();
    debug!(config = %args.config.display(), mode = ?args.mode, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = match AppConfig::load(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Early check: ensure the output dir is writable before spending API calls
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Collaborators ----
    let http = build_http_client(
        config.clash_proxy.as_deref(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let source = NewsApiClient::new(
        http.clone(),
        NewsApiSettings {
            base_url: config.newsapi_base_url.clone(),
            api_key: config.newsapi_key.clone(),
            language: config.language.clone(),
            sort_by: config.sort_by.clone(),
            page_size: config.page_size,
        },
    );
    let llm = DeepSeekClient::new(
        http,
        LlmSettings::new(
            config.llm_base_url.clone(),
            config.deepseek_api_key.clone(),
            config.llm_model.clone(),
        ),
    );
    let summarizer = Summarizer::new(llm, config.concurrency, config.summary_language.clone());

    let report = ReportSettings {
        output_dir: config.output_dir.clone(),
        title: config.report_title.clone(),
        date: Local::now().date_naive(),
    };
    info!(
        mode = ?args.mode,
        concurrency = summarizer.concurrency(),
        date = %report.date,
        "Starting digest run"
    );

    // ---- Run ----
    let outcome = match args.mode {
        RunMode::Concurrent => run_concurrent(&source, &summarizer, &config.keywords, &report).await,
        RunMode::Serial => run_serial(&source, &summarizer, &config.keywords, &report).await,
    };
    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Digest run failed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        articles = summary.articles,
        path = %summary.path.display(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Digest complete"
    );

    Ok(())
}
