use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;

use crate::constants::REGISTER_REQUIRED_HEADERS;
use crate::error::{CleaningError, Result};
use crate::pipeline::ingestion::nls_reader::RowIssue;

/// Check that every required header is present, matched exactly.
pub fn validate_headers(headers: &StringRecord) -> Result<()> {
    let found: Vec<String> = headers.iter().map(str::to_string).collect();
    let missing: Vec<String> = REGISTER_REQUIRED_HEADERS
        .iter()
        .filter(|required| !found.iter().any(|h| h.as_str() == **required))
        .map(|required| required.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CleaningError::MissingHeaders {
            expected: REGISTER_REQUIRED_HEADERS.iter().map(|h| h.to_string()).collect(),
            found,
            missing,
        })
    }
}

#[derive(Debug)]
pub enum RegisterRow {
    /// Data row with its 0-based position among the file's data rows
    Row { index: usize, record: StringRecord },
    Malformed(RowIssue),
}

/// Comma-delimited register transcription with validated headers.
pub struct RegisterReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    index: usize,
}

impl RegisterReader {
    /// Open the file and fail fast if a required header is missing.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CleaningError::InputNotFound(path.to_path_buf()));
        }
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        validate_headers(&headers)?;
        Ok(Self {
            reader,
            headers,
            index: 0,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Position of a header; required headers are always present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

impl Iterator for RegisterReader {
    type Item = Result<RegisterRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        let read = self.reader.read_record(&mut record);
        let index = self.index;
        match read {
            Ok(true) => {
                self.index += 1;
                Some(Ok(RegisterRow::Row { index, record }))
            }
            Ok(false) => None,
            Err(e) if e.is_io_error() => Some(Err(e.into())),
            Err(e) => {
                self.index += 1;
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                Some(Ok(RegisterRow::Malformed(RowIssue {
                    line,
                    reason: e.to_string(),
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_headers_with_extras_pass() {
        let mut headers: Vec<&str> = REGISTER_REQUIRED_HEADERS.to_vec();
        headers.push("Notes");
        assert!(validate_headers(&StringRecord::from(headers)).is_ok());
    }

    #[test]
    fn test_missing_header_is_named() {
        let headers: Vec<&str> = REGISTER_REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|h| *h != "Publisher")
            .collect();
        match validate_headers(&StringRecord::from(headers)) {
            Err(CleaningError::MissingHeaders {
                missing, expected, ..
            }) => {
                assert_eq!(missing, vec!["Publisher".to_string()]);
                assert_eq!(expected.len(), REGISTER_REQUIRED_HEADERS.len());
            }
            other => panic!("expected MissingHeaders, got {:?}", other),
        }
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let headers: Vec<String> = REGISTER_REQUIRED_HEADERS
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let err = validate_headers(&StringRecord::from(headers)).unwrap_err();
        assert!(err.to_string().contains("Book Title"));
    }
}
