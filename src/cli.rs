//! Command-line interface definitions for the finance digest.
//!
//! Most settings live in `config.yaml`; the flags here pick the run mode and
//! override the handful of settings worth changing per run. API keys can also
//! come from the environment.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How articles are summarized and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Bounded parallel summarization; sections are streamed to the report as they finish.
    Concurrent,
    /// One article at a time; the report is written once, in fetch order.
    Serial,
}

/// Command-line arguments for the finance digest.
///
/// # Examples
///
/// ```sh
/// # Concurrent run with config.yaml from the working directory
/// finance_digest
///
/// # Serial run into a different directory
/// finance_digest --mode serial --output-dir ./reports
///
/// # Keys from the environment, at most 8 LLM calls at once
/// NEWSAPI_KEY=... DEEPSEEK_API_KEY=... finance_digest -c prod.yaml --concurrency 8
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Execution mode
    #[arg(short, long, value_enum, default_value_t = RunMode::Concurrent)]
    pub mode: RunMode,

    /// Directory to write the report into (overrides `output_dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum simultaneous LLM calls (overrides `concurrency`)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// NewsAPI key (overrides `newsapi_key`)
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// DeepSeek API key (overrides `deepseek_api_key`)
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,
}
