//! Utility functions for logging, HTTP client setup, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging provider error bodies
//! - Construction of the shared `reqwest` client (timeout and optional proxy)
//! - File system validation for the output directory

use crate::error::OutputError;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Browser User-Agent sent to NewsAPI, which rejects some default client agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// character boundary, with an ellipsis and the dropped byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Build the HTTP client shared by the news source and the LLM client.
///
/// `timeout` is applied to every request. An unparsable `proxy` is logged and
/// ignored, in which case the client connects directly.
pub fn build_http_client(
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(addr) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
        match reqwest::Proxy::all(addr) {
            Ok(p) => {
                info!(proxy = %addr, "Routing requests through proxy");
                builder = builder.proxy(p);
            }
            Err(e) => warn!(proxy = %addr, error = %e, "Invalid proxy address; connecting directly"),
        }
    }

    builder.build()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns [`OutputError::Io`] if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| OutputError::io(path, e))?;

    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(OutputError::io(path, e)),
    }
}
