//! Stationers' Hall register pipeline.
//!
//! Reads one comma-delimited register transcription, checks its headers and
//! writes `<stem>_export.csv` with an `id` column, every original column and
//! the canonical title.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::constants::{
    CLEAN_TITLE_COLUMN, EXPORT_LABEL, ID_COLUMN, REGISTER_TITLE_HEADER, REGISTER_YEAR_HEADER,
};
use crate::error::{CleaningError, Result};
use crate::metrics;
use crate::pipeline::ingestion::register_reader::{RegisterReader, RegisterRow};
use crate::pipeline::output::DelimitedWriter;
use crate::pipeline::processing::normalize::normalize_title;
use crate::pipeline::{labelled_file, RunSummary};

const PIPELINE: &str = "register";

/// Output path for a register input file.
pub fn register_export_path(input_file: &Path, output_folder: &Path) -> PathBuf {
    let stem = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    labelled_file(output_folder, &stem, EXPORT_LABEL, "csv")
}

#[instrument]
pub fn run_register(input_file: &Path, output_folder: &Path) -> Result<RunSummary> {
    let reader = RegisterReader::open(input_file)?;
    let year_col = required_column(&reader, REGISTER_YEAR_HEADER)?;
    let title_col = required_column(&reader, REGISTER_TITLE_HEADER)?;

    fs::create_dir_all(output_folder)?;
    let output_path = register_export_path(input_file, output_folder);
    let mut header: Vec<String> = vec![ID_COLUMN.to_string()];
    header.extend(reader.headers().iter().map(str::to_string));
    header.push(CLEAN_TITLE_COLUMN.to_string());
    let mut writer = DelimitedWriter::csv(&output_path, &header)?;

    let label = input_file.display().to_string();
    let mut summary = RunSummary::default();
    for row in reader {
        let (index, record) = match row? {
            RegisterRow::Row { index, record } => (index, record),
            RegisterRow::Malformed(issue) => {
                summary.rows_read += 1;
                metrics::row_read(PIPELINE);
                summary.skip_row(&label, &issue);
                metrics::row_skipped(PIPELINE);
                continue;
            }
        };
        summary.rows_read += 1;
        metrics::row_read(PIPELINE);

        let register = record.get(year_col).unwrap_or_default();
        let clean_title = normalize_title(record.get(title_col).unwrap_or_default());
        metrics::title_normalized();

        let id = format!("{}:{}", register, index);
        let mut out = Vec::with_capacity(record.len() + 2);
        out.push(id.as_str());
        out.extend(record.iter());
        out.push(clean_title.as_str());
        writer.write_row(&out)?;
        metrics::row_written(&writer.name());
    }

    let name = writer.name();
    let rows = writer.finish()?;
    summary.rows_written.insert(name, rows);
    summary.files_processed = 1;
    metrics::file_processed(PIPELINE);
    summary.log();
    info!(output = %output_path.display(), "Register export written");
    Ok(summary)
}

fn required_column(reader: &RegisterReader, name: &str) -> Result<usize> {
    reader.column(name).ok_or_else(|| CleaningError::MissingHeaders {
        expected: vec![name.to_string()],
        found: reader.headers().iter().map(str::to_string).collect(),
        missing: vec![name.to_string()],
    })
}
