//! Markdown rendering of the digest.
//!
//! # Layout
//!
//! ```text
//! # Finance Digest (2024-01-01)
//!
//! ## 1. Fed holds rates
//!
//! **Source**: [https://example.com/fed](https://example.com/fed)
//!
//! **Published**: 2024-01-01T12:00:00Z
//!
//! **Summary**:
//!
//! ...model answer...
//!
//! ---
//! ```
//!
//! Streamed reports omit the `N. ` numbering because sections arrive in
//! completion order.

use super::digest_file_name;
use crate::error::OutputError;
use crate::models::SummaryResult;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Report title line followed by a blank line.
pub fn render_header(title: &str, date: NaiveDate) -> String {
    format!("# {} ({})\n\n", title, date.format("%Y-%m-%d"))
}

/// One article section. `number` is the 1-based position in a batched report.
pub fn render_section(result: &SummaryResult, number: Option<usize>) -> String {
    let mut md = match number {
        Some(n) => format!("## {}. {}\n\n", n, result.title_localized),
        None => format!("## {}\n\n", result.title_localized),
    };
    if !result.description_localized.is_empty() {
        md.push_str(&format!("> {}\n\n", result.description_localized));
    }
    md.push_str(&format!("**Source**: [{}]({})\n\n", result.url, result.url));
    md.push_str(&format!("**Published**: {}\n\n", result.published_at));
    md.push_str("**Summary**:\n\n");
    md.push_str(result.summary.trim_end());
    md.push_str("\n\n---\n\n");
    md
}

/// A complete report with numbered sections in the order given.
pub fn render_document(title: &str, date: NaiveDate, results: &[SummaryResult]) -> String {
    let mut md = render_header(title, date);
    for (i, result) in results.iter().enumerate() {
        md.push_str(&render_section(result, Some(i + 1)));
    }
    md
}

/// Write `results` as one report to `<output_dir>/<date>_finance_digest.md`.
///
/// The document is written to a temporary sibling first and renamed into
/// place, so readers never observe a half-written report. An existing report
/// with the same name is replaced.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), count = results.len()))]
pub async fn save_as_markdown(
    output_dir: &Path,
    title: &str,
    date: NaiveDate,
    results: &[SummaryResult],
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(|e| OutputError::io(output_dir, e))?;

    let path = output_dir.join(digest_file_name(date));
    let tmp_path = path.with_extension("md.tmp");
    let md = render_document(title, date, results);

    fs::write(&tmp_path, md)
        .await
        .map_err(|e| OutputError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| OutputError::io(&path, e))?;

    info!(path = %path.display(), "Saved Markdown report");
    Ok(path)
}
