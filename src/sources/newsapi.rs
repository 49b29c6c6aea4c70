//! NewsAPI article source.
//!
//! Queries [`/v2/everything`](https://newsapi.org/docs/endpoints/everything)
//! with every keyword OR-ed together and a fixed list of sports terms
//! excluded, so a finance keyword like "gold" does not pull in medal tables.
//!
//! # Query Shape
//!
//! ```text
//! ("Federal Reserve" OR "gold price") NOT (sport OR sports OR ... OR tournament)
//! ```

use super::ArticleSource;
use crate::error::FetchError;
use crate::models::{NewsResponse, RawArticle};
use crate::utils::BROWSER_USER_AGENT;
use itertools::Itertools;
use reqwest::header::USER_AGENT;
use tracing::{debug, info, instrument};
use url::Url;

/// Terms excluded from every query.
pub const EXCLUDED_TERMS: &[&str] = &[
    "sport",
    "sports",
    "football",
    "soccer",
    "nba",
    "olympic",
    "medal",
    "player",
    "team",
    "match",
    "tournament",
];

/// Search parameters sent alongside the query.
#[derive(Debug, Clone)]
pub struct NewsApiSettings {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    settings: NewsApiSettings,
}

/// Build the NewsAPI `q` expression: quoted keywords OR-ed together, then
/// `NOT (...)` over `exclude` when it is non-empty.
///
/// Blank keywords are skipped. Returns `None` when no keyword remains.
pub fn build_query(keywords: &[String], exclude: &[&str]) -> Option<String> {
    let included = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| format!("\"{k}\""))
        .join(" OR ");
    if included.is_empty() {
        return None;
    }

    let mut q = format!("({included})");
    if !exclude.is_empty() {
        q.push_str(&format!(" NOT ({})", exclude.iter().join(" OR ")));
    }
    Some(q)
}

impl NewsApiClient {
    pub fn new(http: reqwest::Client, settings: NewsApiSettings) -> Self {
        Self { http, settings }
    }

    fn search_url(&self, query: &str) -> Result<Url, FetchError> {
        let base = format!(
            "{}/v2/everything",
            self.settings.base_url.trim_end_matches('/')
        );
        let page_size = self.settings.page_size.to_string();
        Ok(Url::parse_with_params(
            &base,
            &[
                ("q", query),
                ("language", self.settings.language.as_str()),
                ("sortBy", self.settings.sort_by.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.settings.api_key.as_str()),
            ],
        )?)
    }
}

impl ArticleSource for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(keywords = keywords.len()))]
    async fn fetch_articles(&self, keywords: &[String]) -> Result<Vec<RawArticle>, FetchError> {
        let query = build_query(keywords, EXCLUDED_TERMS).ok_or(FetchError::NoKeywords)?;
        debug!(%query, "Built NewsAPI query");
        let url = self.search_url(&query)?;

        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: NewsResponse = resp.json().await.map_err(FetchError::Decode)?;
        if body.status != "ok" {
            return Err(FetchError::Provider {
                status: body.status,
                code: body.code.unwrap_or_default(),
                message: body.message.unwrap_or_default(),
            });
        }

        info!(
            count = body.articles.len(),
            total_results = body.total_results,
            "Fetched NewsAPI articles"
        );
        Ok(body.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn client_for(server: &Server) -> NewsApiClient {
        NewsApiClient::new(
            reqwest::Client::new(),
            NewsApiSettings {
                base_url: server.url(),
                api_key: "news-key".to_string(),
                language: "en".to_string(),
                sort_by: "publishedAt".to_string(),
                page_size: 30,
            },
        )
    }

    #[test]
    fn test_build_query_with_exclusions() {
        let q = build_query(&keywords(&[" Federal Reserve ", "gold"]), &["sport", "nba"]).unwrap();
        assert_eq!(q, r#"("Federal Reserve" OR "gold") NOT (sport OR nba)"#);
    }

    #[test]
    fn test_build_query_without_exclusions() {
        let q = build_query(&keywords(&["oil"]), &[]).unwrap();
        assert_eq!(q, r#"("oil")"#);
    }

    #[test]
    fn test_build_query_skips_blank_keywords() {
        assert_eq!(build_query(&keywords(&["", "  "]), EXCLUDED_TERMS), None);
        let q = build_query(&keywords(&["", "CPI"]), &[]).unwrap();
        assert_eq!(q, r#"("CPI")"#);
    }

    #[tokio::test]
    async fn test_fetch_articles_sends_search_parameters() {
        let mut server = Server::new_async().await;
        let expected_q = build_query(&keywords(&["inflation"]), EXCLUDED_TERMS).unwrap();
        let mock = server
            .mock("GET", Matcher::Regex("^/v2/everything".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), expected_q),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("sortBy".into(), "publishedAt".into()),
                Matcher::UrlEncoded("pageSize".into(), "30".into()),
                Matcher::UrlEncoded("apiKey".into(), "news-key".into()),
            ]))
            .match_header("user-agent", BROWSER_USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "totalResults": 2,
                    "articles": [
                        {"title": "First", "description": null, "url": "https://a", "publishedAt": "t1", "content": "c1"},
                        {"title": "Second", "description": "d", "url": "https://b", "publishedAt": "t2", "content": null}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let articles = client_for(&server)
            .fetch_articles(&keywords(&["inflation"]))
            .await
            .unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].url, "https://a");
        assert_eq!(articles[1].title, "Second");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_articles_non_success_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/v2/everything".to_string()))
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_articles(&keywords(&["gold"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 429 }));
    }

    #[tokio::test]
    async fn test_fetch_articles_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/v2/everything".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_articles(&keywords(&["gold"]))
            .await
            .unwrap_err();
        match err {
            FetchError::Provider { code, message, .. } => {
                assert_eq!(code, "rateLimited");
                assert_eq!(message, "Too many requests");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_articles_malformed_payload() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/v2/everything".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_articles(&keywords(&["gold"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_articles_rejects_empty_keywords() {
        let server = Server::new_async().await;
        let err = client_for(&server).fetch_articles(&[]).await.unwrap_err();
        assert!(matches!(err, FetchError::NoKeywords));
    }
}
