//! Data models for fetched articles and their summarized representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`]: An article as returned by the news source
//! - [`NewsResponse`]: The NewsAPI `/v2/everything` envelope
//! - [`SummaryResult`]: One summarized article, ready to be written to the report
//!
//! The wire structs use `#[serde(rename_all = "camelCase")]` to match the
//! NewsAPI JSON schema.

use serde::{Deserialize, Deserializer};

/// A raw news article as returned by the article source.
///
/// NewsAPI sends `null` for missing text fields; those deserialize to the
/// empty string so the rest of the pipeline never deals with `Option`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    /// The article headline.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Short teaser text supplied by the publisher.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Canonical article URL. Used as the identity of the article across the pipeline.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Publication timestamp exactly as the provider sent it.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub published_at: String,
    /// Article body, possibly cut off with a `[+N chars]` marker.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

/// Response envelope of the NewsAPI `/v2/everything` endpoint.
///
/// On failure NewsAPI answers with `status: "error"` plus `code` and
/// `message`, and no `articles`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A summarized article.
///
/// Exactly one is produced for every [`RawArticle`] handed to the summarizer.
/// `url` and `published_at` are copied from the source article unchanged.
/// `summary` holds either the model's answer or a `summary failed:` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub title_localized: String,
    pub description_localized: String,
    pub url: String,
    pub published_at: String,
    pub summary: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
