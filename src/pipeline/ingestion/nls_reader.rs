//! Reader for National Library of Scotland catalogue exports.
//!
//! Each line is one entry made of tab separated `Key: value` pairs in a fixed
//! order:
//!
//! ```text
//! Title: {title}<tab>Creator: {creator}<tab>...<tab>Source: {source}
//! ```
//!
//! At least one file in the dataset (#45) uses a different layout. The first
//! row of every file is sniffed so such a file is reported as
//! [`NlsLayout::Unsupported`] instead of being parsed into garbage.

use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use tracing::warn;

use crate::constants::{NLS_DATE_INDEX, NLS_FIELDS, NLS_TITLE_INDEX};
use crate::error::{CleaningError, Result};

static FILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})\.(?:txt|tsv)$").expect("file number regex"));

/// Layout of an NLS input file, decided from its first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NlsLayout {
    KeyValue,
    Empty,
    Unsupported { reason: String },
}

/// A row that could not be read as an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: u64,
    pub reason: String,
}

/// One catalogue entry with the keys stripped from its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlsEntry {
    pub id: String,
    pub line: u64,
    pub values: Vec<String>,
}

impl NlsEntry {
    pub fn title(&self) -> &str {
        &self.values[NLS_TITLE_INDEX]
    }

    pub fn date(&self) -> &str {
        &self.values[NLS_DATE_INDEX]
    }
}

#[derive(Debug)]
pub enum NlsRow {
    Entry(NlsEntry),
    Malformed(RowIssue),
}

/// Identifier prefix for a file's entries: the two-digit number before the
/// extension (`data_34.txt` -> `34`), or the file stem when there is none.
pub fn file_id(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if let Some(caps) = FILE_NUMBER.captures(name) {
        return caps[1].to_string();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    warn!(file = %path.display(), "File not numbered, using file stem as id prefix");
    stem
}

/// Strip the `Key:` prefix of each field and check keys against the expected
/// order. Returns the 15 values.
pub fn parse_fields<'a, I>(fields: I) -> std::result::Result<Vec<String>, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields: Vec<&str> = fields.into_iter().collect();
    if fields.len() < NLS_FIELDS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            NLS_FIELDS.len(),
            fields.len()
        ));
    }
    if let Some(extra) = fields[NLS_FIELDS.len()..].iter().find(|f| !f.trim().is_empty()) {
        return Err(format!("unexpected trailing field {:?}", extra));
    }

    let mut values = Vec::with_capacity(NLS_FIELDS.len());
    for (field, expected) in fields.iter().zip(NLS_FIELDS) {
        let value = match field.split_once(':') {
            Some((key, value)) => {
                if !key.trim().eq_ignore_ascii_case(expected) {
                    return Err(format!(
                        "field key {:?} where {:?} was expected",
                        key.trim(),
                        expected
                    ));
                }
                value.trim_end_matches('/').trim().to_string()
            }
            None => String::new(),
        };
        values.push(value);
    }
    Ok(values)
}

/// Decide whether a row uses the key/value layout.
pub fn sniff_layout(record: &StringRecord) -> NlsLayout {
    let has_title_key = record
        .get(NLS_TITLE_INDEX)
        .and_then(|f| f.split_once(':'))
        .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case(NLS_FIELDS[NLS_TITLE_INDEX]));
    if !has_title_key {
        return NlsLayout::Unsupported {
            reason: "first field is not a `Title:` pair".to_string(),
        };
    }
    match parse_fields(record.iter()) {
        Ok(_) => NlsLayout::KeyValue,
        Err(reason) => NlsLayout::Unsupported { reason },
    }
}

/// Streaming reader over one NLS file.
pub struct NlsReader {
    reader: csv::Reader<File>,
    pending: VecDeque<csv::Result<StringRecord>>,
    layout: NlsLayout,
    file_id: String,
    row: usize,
}

impl NlsReader {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CleaningError::InputNotFound(path.to_path_buf()));
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(path)?;

        // Rows that fail to decode (bad UTF-8) stay queued as malformed rows;
        // the layout comes from the first row that decodes.
        let mut pending = VecDeque::new();
        let layout = loop {
            let mut record = StringRecord::new();
            match reader.read_record(&mut record) {
                Ok(true) => {
                    let layout = sniff_layout(&record);
                    pending.push_back(Ok(record));
                    break layout;
                }
                Ok(false) if pending.is_empty() => break NlsLayout::Empty,
                Ok(false) => break NlsLayout::KeyValue,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => pending.push_back(Err(e)),
            }
        };

        Ok(Self {
            reader,
            pending,
            layout,
            file_id: file_id(path),
            row: 0,
        })
    }

    pub fn layout(&self) -> &NlsLayout {
        &self.layout
    }

    fn next_record(&mut self) -> Option<csv::Result<StringRecord>> {
        if let Some(record) = self.pending.pop_front() {
            return Some(record);
        }
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Iterator for NlsReader {
    type Item = Result<NlsRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.next_record()? {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Some(Err(e.into())),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                self.row += 1;
                return Some(Ok(NlsRow::Malformed(RowIssue {
                    line,
                    reason: e.to_string(),
                })));
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let id = format!("{}:{}", self.file_id, self.row);
        self.row += 1;

        Some(Ok(match parse_fields(record.iter()) {
            Ok(values) => NlsRow::Entry(NlsEntry { id, line, values }),
            Err(reason) => NlsRow::Malformed(RowIssue { line, reason }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn row(title: &str, date: &str) -> String {
        NLS_FIELDS
            .iter()
            .map(|key| {
                let mut label = key.to_string();
                label[..1].make_ascii_uppercase();
                match *key {
                    "title" => format!("{}: {}", label, title),
                    "date" => format!("{}: {}", label, date),
                    _ => format!("{}: x", label),
                }
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    #[test]
    fn test_parse_fields_strips_keys() {
        let line = row("Rome: a history /", "1863");
        let values = parse_fields(line.split('\t')).unwrap();
        assert_eq!(values.len(), 15);
        assert_eq!(values[0], "Rome: a history");
        assert_eq!(values[4], "1863");
    }

    #[test]
    fn test_parse_fields_ignores_empty_trailing_tabs() {
        let line = format!("{}\t\t", row("Poems", "1863"));
        assert!(parse_fields(line.split('\t')).is_ok());
    }

    #[test]
    fn test_parse_fields_rejects_short_rows() {
        let err = parse_fields("Title: a\tCreator: b".split('\t')).unwrap_err();
        assert!(err.contains("expected 15 fields"));
    }

    #[test]
    fn test_parse_fields_rejects_wrong_keys() {
        let line = row("Poems", "1863").replace("Date:", "Year:");
        let err = parse_fields(line.split('\t')).unwrap_err();
        assert!(err.contains("Year"));
    }

    #[test]
    fn test_sniff_rejects_plain_columns() {
        let record = StringRecord::from(vec!["Poems"; 15]);
        assert!(matches!(sniff_layout(&record), NlsLayout::Unsupported { .. }));

        let line = row("Poems", "1863");
        let record = StringRecord::from(line.split('\t').collect::<Vec<_>>());
        assert_eq!(sniff_layout(&record), NlsLayout::KeyValue);
    }

    #[test]
    fn test_file_id() {
        assert_eq!(file_id(&PathBuf::from("/data/nls_34.txt")), "34");
        assert_eq!(file_id(&PathBuf::from("/data/nls_07.tsv")), "07");
        assert_eq!(file_id(&PathBuf::from("/data/test_nls_sample.txt")), "test_nls_sample");
    }

    #[test]
    fn test_undecodable_first_row_is_malformed_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nls_13.txt");
        let mut file = File::create(&path).unwrap();
        let mut bad = row("Po\u{0}ms", "1863").into_bytes();
        let at = bad.iter().position(|b| *b == 0).unwrap();
        bad[at] = 0xE9;
        file.write_all(&bad).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", row("Essays", "1863")).unwrap();
        drop(file);

        let reader = NlsReader::open(&path).unwrap();
        assert_eq!(reader.layout(), &NlsLayout::KeyValue);
        let rows: Vec<_> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            NlsRow::Malformed(issue) => assert!(issue.reason.contains("utf-8")),
            other => panic!("expected malformed row, got {:?}", other),
        }
        match &rows[1] {
            NlsRow::Entry(entry) => {
                assert_eq!(entry.id, "13:1");
                assert_eq!(entry.title(), "Essays");
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_yields_entries_and_issues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nls_12.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", row("Poems", "1863")).unwrap();
        writeln!(file, "Title: broken\tCreator: y").unwrap();
        writeln!(file, "{}", row("Essays", "c1862")).unwrap();
        drop(file);

        let reader = NlsReader::open(&path).unwrap();
        assert_eq!(reader.layout(), &NlsLayout::KeyValue);
        let rows: Vec<_> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        match &rows[0] {
            NlsRow::Entry(entry) => {
                assert_eq!(entry.id, "12:0");
                assert_eq!(entry.title(), "Poems");
            }
            other => panic!("expected entry, got {:?}", other),
        }
        assert!(matches!(&rows[1], NlsRow::Malformed(issue) if issue.line == 2));
        match &rows[2] {
            NlsRow::Entry(entry) => {
                assert_eq!(entry.id, "12:2");
                assert_eq!(entry.date(), "c1862");
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }
}
