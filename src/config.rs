//! Runtime configuration loaded from `config.yaml`.
//!
//! Only the API keys and the keyword list have no sensible default; every other
//! key falls back to the values below when absent.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Maximum simultaneous LLM calls when the config does not say otherwise.
pub const DEFAULT_CONCURRENCY: usize = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Optional HTTP(S) proxy used for every outbound request.
    #[serde(default)]
    pub clash_proxy: Option<String>,
    #[serde(default)]
    pub newsapi_key: String,
    #[serde(default)]
    pub deepseek_api_key: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_newsapi_base_url")]
    pub newsapi_base_url: String,
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Language the model is asked to translate the digest into.
    #[serde(default = "default_summary_language")]
    pub summary_language: String,
    #[serde(default = "default_report_title")]
    pub report_title: String,
    /// Client-wide timeout; the only bound on a hung LLM call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_page_size() -> u32 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

fn default_sort_by() -> String {
    "publishedAt".to_string()
}

fn default_newsapi_base_url() -> String {
    "https://newsapi.org".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_summary_language() -> String {
    "Chinese".to_string()
}

fn default_report_title() -> String {
    "Finance Digest".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    /// Parse a config from YAML text without validating it.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse the config file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&text)?;
        info!(keywords = config.keywords.len(), "Loaded configuration");
        Ok(config)
    }

    /// Check that every setting without a default has been provided.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.newsapi_key.trim().is_empty() {
            return Err(ConfigError::Missing("newsapi_key"));
        }
        if self.deepseek_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("deepseek_api_key"));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Missing("keywords"));
        }
        Ok(())
    }
}
