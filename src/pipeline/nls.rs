//! National Library of Scotland pipeline.
//!
//! Reads every `*.tsv`/`*.txt` key/value export in a folder, normalizes
//! titles, classifies dates and routes each entry to the export file of every
//! register that accepts it. Export files are opened once per run, so entries
//! from all input files accumulate in the same per-register file.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, instrument, warn};

use crate::config::{RegisterConfig, RegisterSpec, SourceConfig};
use crate::constants::{
    nls_export_header, DEFAULT_NLS_PREFIX, EXPORT_LABEL, NLS_DATE_INDEX, NLS_SOURCE,
    NLS_TITLE_INDEX,
};
use crate::error::{CleaningError, Result};
use crate::metrics;
use crate::pipeline::ingestion::nls_reader::{NlsEntry, NlsLayout, NlsReader, NlsRow};
use crate::pipeline::output::DelimitedWriter;
use crate::pipeline::processing::dates::{parse_date, route, DateClass, ParsedDate};
use crate::pipeline::processing::normalize::normalize_title;
use crate::pipeline::{labelled_file, RunSummary};

const PIPELINE: &str = "nls";
const INPUT_EXTENSIONS: [&str; 2] = ["tsv", "txt"];

#[derive(Debug, Clone)]
pub struct NlsOptions {
    /// Source library code looked up in the register config
    pub source: String,
    /// Export file prefix: `<prefix>_<register>_export.tsv`
    pub prefix: String,
    /// Input file names to leave out (e.g. the differently formatted #45)
    pub exclude: Vec<String>,
    /// Write per-input-file intermediate tables to `<output>/debug/`
    pub debug: bool,
}

impl Default for NlsOptions {
    fn default() -> Self {
        Self {
            source: NLS_SOURCE.to_string(),
            prefix: DEFAULT_NLS_PREFIX.to_string(),
            exclude: Vec::new(),
            debug: false,
        }
    }
}

/// Export path of one register.
pub fn export_path(output_folder: &Path, prefix: &str, register: &str) -> PathBuf {
    labelled_file(
        output_folder,
        prefix,
        &format!("{}_{}", register, EXPORT_LABEL),
        "tsv",
    )
}

/// Input files in `input_folder` with a supported extension, sorted by name,
/// minus any whose file name is in `exclude`.
pub fn discover_input_files(input_folder: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    if !input_folder.is_dir() {
        return Err(CleaningError::InputNotFound(input_folder.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(input_folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| INPUT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if !supported {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if exclude.iter().any(|x| *x == name) {
            info!(file = %name, "Excluded input file");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Run the pipeline over a folder.
#[instrument(skip(config, options), fields(source = %options.source))]
pub fn run_nls(
    input_folder: &Path,
    output_folder: &Path,
    config: &RegisterConfig,
    options: &NlsOptions,
) -> Result<RunSummary> {
    let source = config.source(&options.source)?;
    let files = discover_input_files(input_folder, &options.exclude)?;
    info!(files = files.len(), "Discovered input files");
    process_files(&files, output_folder, source, options)
}

/// One export file per register, keyed by register name.
struct RegisterSinks {
    registers: Vec<RegisterSpec>,
    writers: BTreeMap<String, DelimitedWriter>,
}

impl RegisterSinks {
    fn open(output_folder: &Path, source: &SourceConfig, prefix: &str) -> Result<Self> {
        let registers = source.registers();
        let mut writers = BTreeMap::new();
        for register in &registers {
            let path = export_path(output_folder, prefix, &register.name);
            let writer = DelimitedWriter::tsv(&path, nls_export_header())?;
            writers.insert(register.name.clone(), writer);
        }
        Ok(Self { registers, writers })
    }

    fn finish(self, summary: &mut RunSummary) -> Result<()> {
        for writer in self.writers.into_values() {
            let name = writer.name();
            let rows = writer.finish()?;
            summary.rows_written.insert(name, rows);
        }
        Ok(())
    }
}

/// Run the pipeline over an explicit list of files.
pub fn process_files(
    files: &[PathBuf],
    output_folder: &Path,
    source: &SourceConfig,
    options: &NlsOptions,
) -> Result<RunSummary> {
    fs::create_dir_all(output_folder)?;
    let mut sinks = RegisterSinks::open(output_folder, source, &options.prefix)?;
    let debug_folder = output_folder.join("debug");
    if options.debug {
        fs::create_dir_all(&debug_folder)?;
    }

    let mut summary = RunSummary::default();
    for path in files {
        let span = info_span!("nls_file", file = %path.display());
        let _enter = span.enter();
        println!("Processing: {}", path.display());
        let debug_path = options.debug.then(|| debug_file_path(&debug_folder, path));
        process_file(
            path,
            &options.source,
            &mut sinks,
            debug_path.as_deref(),
            &mut summary,
        )?;
    }

    sinks.finish(&mut summary)?;
    summary.log();
    Ok(summary)
}

fn debug_file_path(debug_folder: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    labelled_file(debug_folder, &stem, "clean", "tsv")
}

const DEBUG_HEADER: [&str; 10] = [
    "id", "line", "title", "clean_title", "date", "class", "min_date", "max_date", "kinds",
    "registers",
];

fn process_file(
    path: &Path,
    source_code: &str,
    sinks: &mut RegisterSinks,
    debug_path: Option<&Path>,
    summary: &mut RunSummary,
) -> Result<()> {
    let label = path.display().to_string();
    let reader = match NlsReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            summary.skip_file(&label, &e.to_string());
            metrics::file_skipped(PIPELINE);
            return Ok(());
        }
    };

    match reader.layout() {
        NlsLayout::KeyValue => {}
        NlsLayout::Empty => {
            warn!("Input file is empty");
            summary.files_processed += 1;
            metrics::file_processed(PIPELINE);
            return Ok(());
        }
        NlsLayout::Unsupported { reason } => {
            summary.skip_file(&label, &format!("unsupported layout: {}", reason));
            metrics::file_skipped(PIPELINE);
            return Ok(());
        }
    }

    let mut debug_writer = match debug_path {
        Some(p) => Some(DelimitedWriter::tsv(p, DEBUG_HEADER)?),
        None => None,
    };

    let mut entries = 0usize;
    for row in reader {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.issues.push(format!("{}: read aborted: {}", label, e));
                warn!(error = %e, "Read error, abandoning rest of file");
                break;
            }
        };
        summary.rows_read += 1;
        metrics::row_read(PIPELINE);

        let entry = match row {
            NlsRow::Entry(entry) => entry,
            NlsRow::Malformed(issue) => {
                summary.skip_row(&label, &issue);
                metrics::row_skipped(PIPELINE);
                continue;
            }
        };
        entries += 1;

        let clean_title = normalize_title(entry.title());
        metrics::title_normalized();
        let parsed = parse_date(entry.date());
        if !parsed.class.is_dated() {
            metrics::date_undated();
        }

        let targets = route(&sinks.registers, &parsed.class);
        if targets.is_empty() {
            summary.rows_unrouted += 1;
            metrics::row_unrouted(PIPELINE);
            debug!(id = %entry.id, date = entry.date(), "Entry matched no register");
        }
        for register in &targets {
            if let Some(writer) = sinks.writers.get_mut(&register.name) {
                let row = export_row(
                    &entry,
                    &clean_title,
                    &parsed.class,
                    source_code,
                    &register.name,
                );
                writer.write_row(row)?;
                metrics::row_written(&writer.name());
            }
        }

        if let Some(writer) = debug_writer.as_mut() {
            let names: Vec<&str> = targets.iter().map(|r| r.name.as_str()).collect();
            writer.write_row(debug_row(&entry, &clean_title, &parsed, &names.join(",")))?;
        }
    }

    if let Some(writer) = debug_writer {
        writer.finish()?;
    }
    summary.files_processed += 1;
    metrics::file_processed(PIPELINE);
    info!(entries, "Finished input file");
    Ok(())
}

/// `YYYY-01-01`, the form expected by the downstream date columns.
fn year_start(year: i32) -> String {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn span_columns(class: &DateClass) -> (String, String) {
    match class.span() {
        Some(span) => (year_start(span.earliest), year_start(span.latest)),
        None => (String::new(), String::new()),
    }
}

/// Columns in the order of [`nls_export_header`].
fn export_row(
    entry: &NlsEntry,
    clean_title: &str,
    class: &DateClass,
    source_code: &str,
    register: &str,
) -> Vec<String> {
    let (min_date, max_date) = span_columns(class);
    let mut row = Vec::with_capacity(entry.values.len() + 6);
    row.push(entry.id.clone());
    for (i, value) in entry.values.iter().enumerate() {
        row.push(value.clone());
        if i == NLS_TITLE_INDEX {
            row.push(clean_title.to_string());
        } else if i == NLS_DATE_INDEX {
            row.push(min_date.clone());
            row.push(max_date.clone());
        }
    }
    row.push(source_code.to_uppercase());
    row.push(register.to_string());
    row
}

fn debug_row(
    entry: &NlsEntry,
    clean_title: &str,
    parsed: &ParsedDate,
    registers: &str,
) -> Vec<String> {
    let (min_date, max_date) = span_columns(&parsed.class);
    let class = if parsed.class.is_dated() { "dated" } else { "undated" };
    let kinds = parsed
        .kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(",");
    vec![
        entry.id.clone(),
        entry.line.to_string(),
        entry.title().to_string(),
        clean_title.to_string(),
        entry.date().to_string(),
        class.to_string(),
        min_date,
        max_date,
        kinds,
        registers.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NLS_FIELDS;
    use crate::pipeline::processing::dates::YearSpan;

    fn entry(title: &str, date: &str) -> NlsEntry {
        let mut values = vec![String::new(); NLS_FIELDS.len()];
        values[0] = title.to_string();
        values[4] = date.to_string();
        NlsEntry {
            id: "34:0".to_string(),
            line: 1,
            values,
        }
    }

    #[test]
    fn test_export_path() {
        let path = export_path(Path::new("out"), "nls_catalog", "undated");
        assert_eq!(path, PathBuf::from("out/nls_catalog_undated_export.tsv"));
    }

    #[test]
    fn test_export_row_matches_header() {
        let entry = entry("Poems, vol. 2", "1863");
        let class = DateClass::Dated(YearSpan::single(1863));
        let row = export_row(&entry, "poems", &class, "nls", "1863b");
        let header = nls_export_header();
        assert_eq!(row.len(), header.len());

        let col = |name: &str| header.iter().position(|h| *h == name).unwrap();
        assert_eq!(row[col("id")], "34:0");
        assert_eq!(row[col("title")], "Poems, vol. 2");
        assert_eq!(row[col("clean_title")], "poems");
        assert_eq!(row[col("date")], "1863");
        assert_eq!(row[col("min_date")], "1863-01-01");
        assert_eq!(row[col("max_date")], "1863-01-01");
        assert_eq!(row[col("source_library")], "NLS");
        assert_eq!(row[col("register")], "1863b");
    }

    #[test]
    fn test_undated_row_has_empty_dates() {
        let entry = entry("Poems", "n.d.");
        let row = export_row(&entry, "poems", &DateClass::Undated, "NLS", "undated");
        let header = nls_export_header();
        let col = |name: &str| header.iter().position(|h| *h == name).unwrap();
        assert_eq!(row[col("min_date")], "");
        assert_eq!(row[col("max_date")], "");
    }

    #[test]
    fn test_discover_filters_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_02.txt", "a_01.tsv", "nls_45.txt", "notes.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = discover_input_files(dir.path(), &["nls_45.txt".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_01.tsv", "b_02.txt"]);
    }

    #[test]
    fn test_discover_missing_folder() {
        let result = discover_input_files(Path::new("/definitely/not/here"), &[]);
        assert!(matches!(result, Err(CleaningError::InputNotFound(_))));
    }
}
