use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// A delimited output file, opened once and appended to for a whole run.
pub struct DelimitedWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl DelimitedWriter {
    /// Create (truncating) `path` and write `header`.
    pub fn create<I, T>(path: &Path, delimiter: u8, header: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
        writer.write_record(header)?;
        debug!(path = %path.display(), "Opened output file");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn tsv<I, T>(path: &Path, header: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::create(path, b'\t', header)
    }

    pub fn csv<I, T>(path: &Path, header: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::create(path, b',', header)
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row)?;
        self.rows += 1;
        Ok(())
    }

    /// File name used as the key in run summaries.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Flush and close, returning the number of data rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        debug!(path = %self.path.display(), rows = self.rows, "Closed output file");
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_tsv_writer_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut writer = DelimitedWriter::tsv(&path, ["id", "title"]).unwrap();
        writer.write_row(["1:0", "poems"]).unwrap();
        writer.write_row(["1:1", "essays"]).unwrap();
        assert_eq!(writer.name(), "out.tsv");
        assert_eq!(writer.finish().unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id\ttitle\n1:0\tpoems\n1:1\tessays\n");
    }
}
