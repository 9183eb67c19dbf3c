//! Run counters for the cleaning pipelines.
//!
//! Counters go through the `metrics` facade and are no-ops unless a recorder
//! is installed. `install_textfile_recorder` installs a Prometheus recorder so
//! a finished run can write its counters to a text exposition file.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{CleaningError, Result};

/// Metric names, kept in one place to avoid magic strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    FilesProcessed,
    FilesSkipped,
    RowsRead,
    RowsSkipped,
    RowsUnrouted,
    RowsWritten,
    TitlesNormalized,
    DatesUndated,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FilesProcessed => "promprint_files_processed_total",
            MetricName::FilesSkipped => "promprint_files_skipped_total",
            MetricName::RowsRead => "promprint_rows_read_total",
            MetricName::RowsSkipped => "promprint_rows_skipped_total",
            MetricName::RowsUnrouted => "promprint_rows_unrouted_total",
            MetricName::RowsWritten => "promprint_rows_written_total",
            MetricName::TitlesNormalized => "promprint_titles_normalized_total",
            MetricName::DatesUndated => "promprint_dates_undated_total",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricName::FilesProcessed => "Input files read to the end",
            MetricName::FilesSkipped => "Input files skipped as unreadable or unsupported",
            MetricName::RowsRead => "Input rows read",
            MetricName::RowsSkipped => "Input rows skipped as malformed",
            MetricName::RowsUnrouted => "Rows accepted by no register",
            MetricName::RowsWritten => "Rows written per output file",
            MetricName::TitlesNormalized => "Titles normalized",
            MetricName::DatesUndated => "Date fields classified as undated",
        }
    }

    pub fn all() -> [MetricName; 8] {
        [
            MetricName::FilesProcessed,
            MetricName::FilesSkipped,
            MetricName::RowsRead,
            MetricName::RowsSkipped,
            MetricName::RowsUnrouted,
            MetricName::RowsWritten,
            MetricName::TitlesNormalized,
            MetricName::DatesUndated,
        ]
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn file_processed(pipeline: &'static str) {
    ::metrics::counter!(MetricName::FilesProcessed.as_str(), "pipeline" => pipeline).increment(1);
}

pub fn file_skipped(pipeline: &'static str) {
    ::metrics::counter!(MetricName::FilesSkipped.as_str(), "pipeline" => pipeline).increment(1);
}

pub fn row_read(pipeline: &'static str) {
    ::metrics::counter!(MetricName::RowsRead.as_str(), "pipeline" => pipeline).increment(1);
}

pub fn row_skipped(pipeline: &'static str) {
    ::metrics::counter!(MetricName::RowsSkipped.as_str(), "pipeline" => pipeline).increment(1);
}

pub fn row_unrouted(pipeline: &'static str) {
    ::metrics::counter!(MetricName::RowsUnrouted.as_str(), "pipeline" => pipeline).increment(1);
}

pub fn row_written(output: &str) {
    ::metrics::counter!(MetricName::RowsWritten.as_str(), "output" => output.to_string())
        .increment(1);
}

pub fn title_normalized() {
    ::metrics::counter!(MetricName::TitlesNormalized.as_str()).increment(1);
}

pub fn date_undated() {
    ::metrics::counter!(MetricName::DatesUndated.as_str()).increment(1);
}

/// Install a global Prometheus recorder without an HTTP listener.
pub fn install_textfile_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CleaningError::Config(format!("failed to install metrics recorder: {}", e)))?;
    for name in MetricName::all() {
        ::metrics::describe_counter!(name.as_str(), name.description());
    }
    info!("Prometheus recorder installed");
    Ok(handle)
}

/// Render the recorder's counters to `path` in Prometheus text format.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    let rendered = handle.render();
    if rendered.is_empty() {
        warn!("No metrics recorded for this run");
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, rendered)?;
    info!(path = %path.display(), "Metrics written");
    Ok(())
}
