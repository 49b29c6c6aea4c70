//! Run orchestration: article source → summarizer → report.
//!
//! Two entry behaviors are offered; the caller picks one:
//! - [`run_concurrent`]: bounded fan-out, each section streamed to the report
//!   as soon as its summary completes.
//! - [`run_serial`]: articles summarized in order, report written once at the end.
//!
//! A failing LLM call never fails a run; it shows up inside the report. Fetch
//! and report-creation failures abort the run before or during writing.

use crate::api::AskAsync;
use crate::error::{OutputError, PipelineError};
use crate::models::{RawArticle, SummaryResult};
use crate::outputs::markdown::save_as_markdown;
use crate::outputs::stream::StreamSink;
use crate::sources::ArticleSource;
use crate::summarizer::Summarizer;
use chrono::NaiveDate;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, instrument, warn};

/// Where and how the report is written.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub title: String,
    pub date: NaiveDate,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of article sections written to the report.
    pub articles: usize,
    pub path: PathBuf,
}

#[instrument(level = "info", skip_all)]
async fn fetch<S: ArticleSource>(source: &S, keywords: &[String]) -> Result<Vec<RawArticle>, PipelineError> {
    match source.fetch_articles(keywords).await {
        Ok(articles) => {
            info!(count = articles.len(), "Fetched related news");
            Ok(articles)
        }
        Err(e) => {
            error!(error = %e, "Fetching news failed");
            Err(e.into())
        }
    }
}

/// Fetch, summarize with bounded concurrency, and stream each section to a
/// freshly created report in completion order.
#[instrument(level = "info", skip_all, fields(output_dir = %report.output_dir.display()))]
pub async fn run_concurrent<S, A>(
    source: &S,
    summarizer: &Summarizer<A>,
    keywords: &[String],
    report: &ReportSettings,
) -> Result<RunSummary, PipelineError>
where
    S: ArticleSource,
    A: AskAsync + 'static,
{
    let articles = fetch(source, keywords).await?;
    let sink = StreamSink::create(&report.output_dir, &report.title, report.date).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let ((), written) = tokio::join!(
        summarizer.summarize_concurrent(articles, tx),
        collect_into(rx, &sink)
    );

    if let Err(e) = sink.close().await {
        warn!(path = %sink.path().display(), error = %e, "Closing report failed");
    }

    let articles = written?;
    Ok(RunSummary {
        articles,
        path: sink.path().to_path_buf(),
    })
}

/// Drain completed summaries into the sink until every sender is gone.
///
/// Writing stops at the first failure. The channel is still drained to the
/// end and the error is returned once it closes.
async fn collect_into(
    mut rx: UnboundedReceiver<SummaryResult>,
    sink: &StreamSink,
) -> Result<usize, OutputError> {
    let mut written = 0usize;
    let mut failure = None;

    while let Some(result) = rx.recv().await {
        if failure.is_some() {
            continue;
        }
        match sink.append(&result).await {
            Ok(()) => written += 1,
            Err(e) => {
                error!(url = %result.url, error = %e, "Writing report section failed");
                failure = Some(e);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(written),
    }
}

/// Fetch, summarize one article at a time, and write the whole report at once
/// with sections in fetch order.
#[instrument(level = "info", skip_all, fields(output_dir = %report.output_dir.display()))]
pub async fn run_serial<S, A>(
    source: &S,
    summarizer: &Summarizer<A>,
    keywords: &[String],
    report: &ReportSettings,
) -> Result<RunSummary, PipelineError>
where
    S: ArticleSource,
    A: AskAsync + 'static,
{
    let articles = fetch(source, keywords).await?;
    let results = summarizer.summarize_serial(articles).await;
    let path = save_as_markdown(&report.output_dir, &report.title, report.date, &results).await?;
    Ok(RunSummary {
        articles: results.len(),
        path,
    })
}
