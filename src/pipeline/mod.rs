// Cleaning pipelines: ingestion (readers), processing (titles, dates), output

pub mod ingestion;
pub mod nls;
pub mod output;
pub mod processing;
pub mod register;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::pipeline::ingestion::nls_reader::RowIssue;

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_unrouted: usize,
    /// Data rows written, keyed by output file name
    pub rows_written: BTreeMap<String, usize>,
    pub issues: Vec<String>,
}

impl RunSummary {
    pub fn skip_row(&mut self, source: &str, issue: &RowIssue) {
        warn!(source, line = issue.line, reason = %issue.reason, "Skipping malformed row");
        self.rows_skipped += 1;
        self.issues
            .push(format!("{} line {}: {}", source, issue.line, issue.reason));
    }

    pub fn skip_file(&mut self, source: &str, reason: &str) {
        warn!(source, reason, "Skipping input file");
        self.files_skipped += 1;
        self.issues.push(format!("{}: {}", source, reason));
    }

    pub fn total_written(&self) -> usize {
        self.rows_written.values().sum()
    }

    pub fn log(&self) {
        info!(
            files_processed = self.files_processed,
            files_skipped = self.files_skipped,
            rows_read = self.rows_read,
            rows_skipped = self.rows_skipped,
            rows_unrouted = self.rows_unrouted,
            rows_written = self.total_written(),
            "Run finished"
        );
        for (file, rows) in &self.rows_written {
            info!(file = %file, rows, "Output written");
        }
    }
}

/// `<out_dir>/<stem>_<label>.<extension>`
pub fn labelled_file(out_dir: &Path, stem: &str, label: &str, extension: &str) -> PathBuf {
    out_dir.join(format!("{}_{}.{}", stem, label, extension))
}
