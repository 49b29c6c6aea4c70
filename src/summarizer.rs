//! Bounded-concurrency summarization of fetched articles.
//!
//! Every [`RawArticle`] handed to a [`Summarizer`] yields exactly one
//! [`SummaryResult`]. When the LLM call fails, the result's summary is a
//! diagnostic starting with [`SUMMARY_FAILED_PREFIX`] instead of being dropped.
//!
//! # Modes
//!
//! - [`Summarizer::summarize_concurrent`]: one task per article, at most
//!   `concurrency` LLM calls in flight, results sent on a channel in
//!   completion order. The channel closes once every task has been joined.
//! - [`Summarizer::summarize_serial`]: one article at a time, results in
//!   input order.

use crate::api::AskAsync;
use crate::error::LlmError;
use crate::models::{RawArticle, SummaryResult};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc::UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Prefix of every placeholder summary written in place of a failed LLM call.
pub const SUMMARY_FAILED_PREFIX: &str = "summary failed:";

/// Strip surrounding whitespace and trailing `[+N chars]` truncation
/// markers from provider content.
///
/// Consecutive trailing markers are removed in one pass, so applying this
/// twice gives the same text as applying it once.
pub fn normalize_content(content: &str) -> String {
    static TRUNCATION_MARKER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:\s*\[\+\d+\s+chars\])+$").expect("truncation pattern is valid")
    });
    TRUNCATION_MARKER
        .replace(content.trim(), "")
        .trim_end()
        .to_string()
}

/// Build the fixed five-part analyst prompt for one article.
pub fn build_prompt(description: &str, content: &str, language: &str) -> String {
    format!(
        "You are a professional macro-finance analyst. Based on the news below, complete these tasks:\n\
         1. Extract the key points of the news and translate them into {language}\n\
         2. Core conclusion\n\
         3. Impact on the US dollar (up / down / neutral)\n\
         4. Impact on gold\n\
         5. Risk level (low / medium / high)\n\
         News summary:\n\
         {description}\n\
         News body:\n\
         {content}"
    )
}

/// Render an LLM failure as a report-visible summary.
pub fn failure_summary(reason: impl std::fmt::Display) -> String {
    format!("{SUMMARY_FAILED_PREFIX} {reason}")
}

/// An article with its text normalized and its prompt built, waiting for the
/// model's answer.
#[derive(Debug)]
struct PreparedArticle {
    title: String,
    description: String,
    url: String,
    published_at: String,
    prompt: String,
}

impl PreparedArticle {
    fn new(index: usize, article: RawArticle, language: &str) -> Self {
        let description = article.description.trim().to_string();
        let content = normalize_content(&article.content);
        let prompt = build_prompt(&description, &content, language);
        let title = match article.title.trim() {
            "" => format!("Article {}", index + 1),
            t => t.to_string(),
        };
        Self {
            title,
            description,
            url: article.url,
            published_at: article.published_at,
            prompt,
        }
    }

    fn into_result(self, outcome: Result<String, LlmError>) -> SummaryResult {
        match outcome {
            Ok(answer) => self.with_summary(answer),
            Err(e) => self.into_failure(e),
        }
    }

    fn into_failure(self, reason: impl std::fmt::Display) -> SummaryResult {
        warn!(url = %self.url, error = %reason, "Summarization failed; recording placeholder");
        self.with_summary(failure_summary(reason))
    }

    fn with_summary(self, summary: String) -> SummaryResult {
        SummaryResult {
            title_localized: self.title,
            description_localized: self.description,
            url: self.url,
            published_at: self.published_at,
            summary,
        }
    }
}

/// Fans articles out to an LLM behind a counting admission gate.
#[derive(Debug)]
pub struct Summarizer<A> {
    llm: Arc<A>,
    gate: Arc<Semaphore>,
    concurrency: usize,
    language: String,
}

impl<A> Summarizer<A>
where
    A: AskAsync + 'static,
{
    /// `concurrency` bounds simultaneous LLM calls; 0 is treated as 1.
    pub fn new(llm: A, concurrency: usize, language: impl Into<String>) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            llm: Arc::new(llm),
            gate: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            language: language.into(),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Summarize every article on its own task, sending each result on `tx`
    /// as soon as it is ready.
    ///
    /// Returns after all tasks have been joined, dropping `tx`. A receiver
    /// draining the other end therefore sees the channel close exactly when
    /// the last result has been delivered. A task that panics is replaced by a
    /// placeholder result for its article.
    #[instrument(level = "info", skip_all, fields(articles = articles.len(), concurrency = self.concurrency))]
    pub async fn summarize_concurrent(
        &self,
        articles: Vec<RawArticle>,
        tx: UnboundedSender<SummaryResult>,
    ) {
        let mut tasks = JoinSet::new();
        // Identity of every task still running, kept so a panicked task can
        // still be reported.
        let mut in_flight = HashMap::new();

        for (index, article) in articles.into_iter().enumerate() {
            let prepared = PreparedArticle::new(index, article, &self.language);
            let fallback = SummaryResult {
                title_localized: prepared.title.clone(),
                description_localized: prepared.description.clone(),
                url: prepared.url.clone(),
                published_at: prepared.published_at.clone(),
                summary: String::new(),
            };

            let llm = Arc::clone(&self.llm);
            let gate = Arc::clone(&self.gate);
            let tx = tx.clone();
            let handle = tasks.spawn(async move {
                let result = match gate.acquire().await {
                    Ok(permit) => {
                        debug!(index, url = %prepared.url, "Calling LLM");
                        let outcome = llm.ask(&prepared.prompt).await;
                        drop(permit);
                        prepared.into_result(outcome)
                    }
                    Err(closed) => prepared.into_failure(closed),
                };
                if tx.send(result).is_err() {
                    warn!(index, "Result receiver dropped; discarding summary");
                }
            });
            in_flight.insert(handle.id(), fallback);
        }

        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, ())) => {
                    in_flight.remove(&id);
                    completed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Summarization task aborted");
                    if let Some(mut fallback) = in_flight.remove(&e.id()) {
                        fallback.summary = failure_summary(format!("task aborted: {e}"));
                        let _ = tx.send(fallback);
                    }
                }
            }
        }

        info!(completed, "All summarization tasks joined");
    }

    /// Summarize articles one after another, returning results in input order.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn summarize_serial(&self, articles: Vec<RawArticle>) -> Vec<SummaryResult> {
        let llm = &self.llm;
        let language = self.language.as_str();
        stream::iter(articles.into_iter().enumerate())
            .then(|(index, article)| async move {
                let prepared = PreparedArticle::new(index, article, language);
                debug!(index, url = %prepared.url, "Calling LLM");
                let outcome = llm.ask(&prepared.prompt).await;
                prepared.into_result(outcome)
            })
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Records how many calls overlap and fails any prompt containing `FAIL`.
    #[derive(Debug, Default)]
    struct CountingLlm {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl AskAsync for CountingLlm {
        async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt.contains("FAIL") {
                Err(LlmError::Status {
                    status: 500,
                    body: "internal error".to_string(),
                })
            } else {
                Ok(format!("digest of {}", prompt.len()))
            }
        }
    }

    impl AskAsync for Arc<CountingLlm> {
        async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
            CountingLlm::ask(self, prompt).await
        }
    }

    fn article(n: usize, content: &str) -> RawArticle {
        RawArticle {
            title: format!("Title {n}"),
            description: format!("  description {n}  "),
            url: format!("https://news.example/{n}"),
            published_at: format!("2024-01-01T00:00:{n:02}Z"),
            content: content.to_string(),
        }
    }

    async fn run_concurrent<A: AskAsync + 'static>(
        summarizer: &Summarizer<A>,
        articles: Vec<RawArticle>,
    ) -> Vec<SummaryResult> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let collector = async {
            let mut out = Vec::new();
            while let Some(r) = rx.recv().await {
                out.push(r);
            }
            out
        };
        let ((), results) = tokio::join!(summarizer.summarize_concurrent(articles, tx), collector);
        results
    }

    #[test]
    fn test_normalize_content_strips_marker() {
        let raw = "  Gold rallied as the dollar slipped… [+2048 chars]  ";
        assert_eq!(normalize_content(raw), "Gold rallied as the dollar slipped…");
    }

    #[test]
    fn test_normalize_content_is_idempotent() {
        for raw in [
            "Body text [+12 chars]",
            "Body text",
            "  padded  ",
            "[+5 chars]",
            "",
            "Mentions [+3 chars] mid-sentence",
            "Doubled [+1 chars] [+2 chars]",
        ] {
            let once = normalize_content(raw);
            assert_eq!(normalize_content(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn test_normalize_content_strips_repeated_markers() {
        assert_eq!(normalize_content("Doubled [+1 chars] [+2 chars]"), "Doubled");
    }

    #[test]
    fn test_normalize_content_keeps_inner_marker() {
        assert_eq!(
            normalize_content("Mentions [+3 chars] mid-sentence"),
            "Mentions [+3 chars] mid-sentence"
        );
    }

    #[test]
    fn test_build_prompt_has_five_tasks() {
        let prompt = build_prompt("desc", "body", "Chinese");
        for part in ["1. ", "2. ", "3. ", "4. ", "5. "] {
            assert!(prompt.contains(part));
        }
        assert!(prompt.contains("translate them into Chinese"));
        assert!(prompt.contains("US dollar (up / down / neutral)"));
        assert!(prompt.contains("Risk level (low / medium / high)"));
        assert!(prompt.ends_with("News body:\nbody"));
    }

    #[tokio::test]
    async fn test_serial_preserves_order_and_count() {
        let summarizer = Summarizer::new(CountingLlm::default(), 3, "Chinese");
        let articles: Vec<_> = (0..7).map(|n| article(n, "body [+10 chars]")).collect();
        let expected: Vec<_> = articles.iter().map(|a| a.url.clone()).collect();

        let results = summarizer.summarize_serial(articles).await;
        let urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, expected);
        assert_eq!(results[2].description_localized, "description 2");
        assert_eq!(results[2].published_at, "2024-01-01T00:00:02Z");
    }

    #[tokio::test]
    async fn test_serial_runs_one_call_at_a_time() {
        let llm = Arc::new(CountingLlm::default());
        let summarizer = Summarizer::new(Arc::clone(&llm), 10, "Chinese");
        let articles: Vec<_> = (0..5).map(|n| article(n, "body")).collect();
        summarizer.summarize_serial(articles).await;
        assert_eq!(llm.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_yields_one_result_per_article() {
        let summarizer = Summarizer::new(CountingLlm::default(), 4, "Chinese");
        let articles: Vec<_> = (0..25).map(|n| article(n, "body")).collect();
        let expected: HashSet<_> = articles.iter().map(|a| a.url.clone()).collect();

        let results = run_concurrent(&summarizer, articles).await;
        assert_eq!(results.len(), 25);
        let urls: HashSet<_> = results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_concurrent_respects_admission_gate() {
        for limit in [1usize, 3, 8] {
            let llm = Arc::new(CountingLlm::default());
            let summarizer = Summarizer::new(Arc::clone(&llm), limit, "Chinese");
            let articles: Vec<_> = (0..40).map(|n| article(n, "body")).collect();

            let results = run_concurrent(&summarizer, articles).await;
            assert_eq!(results.len(), 40);
            assert_eq!(llm.calls.load(Ordering::SeqCst), 40);
            let peak = llm.peak.load(Ordering::SeqCst);
            assert!(peak <= limit, "peak {peak} exceeded limit {limit}");
            assert!(peak >= 1);
        }
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let summarizer = Summarizer::new(CountingLlm::default(), 0, "Chinese");
        assert_eq!(summarizer.concurrency(), 1);
        let results = run_concurrent(&summarizer, vec![article(0, "body")]).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_becomes_placeholder_without_aborting_siblings() {
        let summarizer = Summarizer::new(CountingLlm::default(), 2, "Chinese");
        let mut articles: Vec<_> = (0..6).map(|n| article(n, "body")).collect();
        articles[3].content = "FAIL this one".to_string();

        let results = run_concurrent(&summarizer, articles).await;
        assert_eq!(results.len(), 6);

        let failed: Vec<_> = results
            .iter()
            .filter(|r| r.summary.starts_with(SUMMARY_FAILED_PREFIX))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, "https://news.example/3");
        assert!(failed[0].summary.contains("HTTP 500"));
    }

    /// Panics on any prompt containing `BOOM`.
    struct PanickingLlm;

    impl AskAsync for PanickingLlm {
        async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
            tokio::task::yield_now().await;
            if prompt.contains("BOOM") {
                panic!("model client blew up");
            }
            Ok("fine".to_string())
        }
    }

    #[tokio::test]
    async fn test_panicked_task_still_yields_placeholder() {
        let summarizer = Summarizer::new(PanickingLlm, 2, "Chinese");
        let mut articles: Vec<_> = (0..5).map(|n| article(n, "body")).collect();
        articles[2].content = "BOOM".to_string();

        let results = run_concurrent(&summarizer, articles).await;
        assert_eq!(results.len(), 5);

        let failed: Vec<_> = results
            .iter()
            .filter(|r| r.summary.starts_with(SUMMARY_FAILED_PREFIX))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, "https://news.example/2");
        assert_eq!(failed[0].title_localized, "Title 2");
        assert!(failed[0].summary.contains("task aborted"));
    }

    #[tokio::test]
    async fn test_concurrent_empty_input_closes_channel() {
        let summarizer = Summarizer::new(CountingLlm::default(), 2, "Chinese");
        let results = run_concurrent(&summarizer, Vec::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_blank_title_gets_numbered_fallback() {
        let summarizer = Summarizer::new(CountingLlm::default(), 1, "Chinese");
        let mut a = article(0, "body");
        a.title = "   ".to_string();
        let results = summarizer.summarize_serial(vec![a]).await;
        assert_eq!(results[0].title_localized, "Article 1");
    }
}
