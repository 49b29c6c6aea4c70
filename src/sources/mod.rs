//! Article sources.
//!
//! A source turns a keyword list into an ordered batch of [`RawArticle`]s.
//! Any failure here is fatal for the run: without articles there is nothing
//! to summarize.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | NewsAPI | [`newsapi`] | `/v2/everything` search, keyword OR-query with an exclusion list |

use crate::error::FetchError;
use crate::models::RawArticle;
use std::future::Future;

pub mod newsapi;

/// Something that can produce articles for a set of keywords.
pub trait ArticleSource: Send + Sync {
    fn fetch_articles(
        &self,
        keywords: &[String],
    ) -> impl Future<Output = Result<Vec<RawArticle>, FetchError>> + Send;
}
