//! Streaming report writer.
//!
//! A [`StreamSink`] owns one open report file. Sections are appended and
//! flushed one at a time as results arrive, so a partially completed run still
//! leaves a readable report behind.
//!
//! # File Naming
//!
//! The sink never overwrites an earlier report. When
//! `2024-01-01_finance_digest.md` exists it tries
//! `2024-01-01_finance_digest1.md`, then `...2.md`, up to [`MAX_NAME_SUFFIX`].

use super::digest_file_name;
use super::markdown::{render_header, render_section};
use crate::error::OutputError;
use crate::models::SummaryResult;
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Highest numeric suffix tried before giving up on a free file name.
pub const MAX_NAME_SUFFIX: u32 = 999;

/// Create `<dir>/<file_name>` exclusively, falling back to `<stem>1.<ext>`,
/// `<stem>2.<ext>`, ... when the name is taken.
///
/// Probing and creation are the same `create_new` open, so two runs racing
/// for the same name cannot both get it.
pub async fn create_available(dir: &Path, file_name: &str) -> Result<(PathBuf, File), OutputError> {
    let base = dir.join(file_name);
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (file_name, String::new()),
    };

    for suffix in 0..=MAX_NAME_SUFFIX {
        let path = if suffix == 0 {
            base.clone()
        } else {
            dir.join(format!("{stem}{suffix}{ext}"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Report name taken");
            }
            Err(e) => return Err(OutputError::io(path, e)),
        }
    }

    Err(OutputError::NameExhaustion {
        base,
        attempts: MAX_NAME_SUFFIX,
    })
}

/// An open report that sections are appended to as they complete.
#[derive(Debug)]
pub struct StreamSink {
    path: PathBuf,
    handle: Mutex<Option<BufWriter<File>>>,
}

impl StreamSink {
    /// Create a new report for `date` under `output_dir` and write its header.
    #[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
    pub async fn create(output_dir: &Path, title: &str, date: NaiveDate) -> Result<Self, OutputError> {
        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| OutputError::io(output_dir, e))?;

        let (path, file) = create_available(output_dir, &digest_file_name(date)).await?;
        let writer = start_report(&path, file, &render_header(title, date)).await?;

        info!(path = %path.display(), "Opened streaming report");
        Ok(Self {
            path,
            handle: Mutex::new(Some(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one section and flush it to disk.
    pub async fn append(&self, result: &SummaryResult) -> Result<(), OutputError> {
        let mut guard = self.handle.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| OutputError::Closed(self.path.clone()))?;
        write_flushed(writer, &self.path, &render_section(result, None)).await?;
        debug!(url = %result.url, "Appended report section");
        Ok(())
    }

    /// Flush and release the file. Calling it again is a no-op.
    pub async fn close(&self) -> Result<(), OutputError> {
        let Some(mut writer) = self.handle.lock().await.take() else {
            return Ok(());
        };
        writer
            .shutdown()
            .await
            .map_err(|e| OutputError::io(&self.path, e))?;
        info!(path = %self.path.display(), "Closed streaming report");
        Ok(())
    }
}

/// Write the header to a freshly created report. On failure the file is
/// removed so the name stays free for the next run.
async fn start_report(path: &Path, file: File, header: &str) -> Result<BufWriter<File>, OutputError> {
    let mut writer = BufWriter::new(file);
    match write_flushed(&mut writer, path, header).await {
        Ok(()) => Ok(writer),
        Err(e) => {
            drop(writer);
            if let Err(rm) = fs::remove_file(path).await {
                warn!(path = %path.display(), error = %rm, "Removing unwritten report failed");
            }
            Err(e)
        }
    }
}

async fn write_flushed(
    writer: &mut BufWriter<File>,
    path: &Path,
    text: &str,
) -> Result<(), OutputError> {
    writer
        .write_all(text.as_bytes())
        .await
        .map_err(|e| OutputError::io(path, e))?;
    writer.flush().await.map_err(|e| OutputError::io(path, e))
}
