//! Report generation.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders the report header and per-article sections, and
//!   writes a whole report in one go (serial mode)
//! - [`stream`]: An open report that sections are appended to as results
//!   arrive (concurrent mode)
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06_finance_digest.md    # first run of the day
//! ├── 2025-05-06_finance_digest1.md   # second streamed run
//! └── 2025-05-06_finance_digest2.md
//! ```
//!
//! The batched writer always targets the unsuffixed name and overwrites it.

use chrono::NaiveDate;

pub mod markdown;
pub mod stream;

/// Report file name for `date`, e.g. `2024-01-01_finance_digest.md`.
pub fn digest_file_name(date: NaiveDate) -> String {
    format!("{}_finance_digest.md", date.format("%Y-%m-%d"))
}
