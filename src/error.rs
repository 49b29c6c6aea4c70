//! Error types for each boundary of the digest pipeline.
//!
//! Fatal errors ([`ConfigError`], [`FetchError`], [`OutputError`]) end the run.
//! The pipeline wraps the last two in [`PipelineError`]; configuration errors
//! surface before the pipeline starts. [`LlmError`] never leaves the
//! summarizer: it is rendered into the article's summary instead.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or validate `config.yaml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Failure of the article source. Aborts the run before any summarization.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no keywords configured")]
    NoKeywords,

    #[error("invalid NewsAPI URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("NewsAPI request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("NewsAPI returned HTTP {status}")]
    Status { status: u16 },

    #[error("cannot decode NewsAPI response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("NewsAPI error (status={status}, code={code}): {message}")]
    Provider {
        status: String,
        code: String,
        message: String,
    },
}

/// Failure of a single LLM call.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("no choices returned")]
    EmptyChoices,
}

/// Failure to create or write the report file.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free file name for {base} after {attempts} attempts")]
    NameExhaustion { base: PathBuf, attempts: u32 },

    #[error("report {0} is already closed")]
    Closed(PathBuf),
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A run-aborting error surfaced to the entry point.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetching news failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("writing report failed: {0}")]
    Output(#[from] OutputError),
}
