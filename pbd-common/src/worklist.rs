//! Work list (CSV) reader
//!
//! Streams the work list one record at a time, in file order. The reader is
//! single-pass: once a record has been yielded it is gone.
//!
//! Only one shape check is performed: the key column must hold a non-blank value.
//! Records failing it come back as [`WorkListEntry::Skipped`] so the caller can
//! warn and move on. Anything else that breaks the parser (bad UTF-8, I/O) is an
//! `Err` and ends the run.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

/// Default work list file name, resolved against the working directory
pub const DEFAULT_WORK_LIST: &str = "projects.csv";
/// Default key column
pub const DEFAULT_KEY_COLUMN: &str = "PROJECT_KEY";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One valid work list record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRow {
    /// Trimmed, non-empty project key
    pub project_key: String,
    /// Every headed column of the record, untrimmed
    pub raw_fields: BTreeMap<String, String>,
    /// 1-based line number in the work list
    pub line: u64,
}

/// Item yielded by [`WorkListReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkListEntry {
    Row(WorkRow),
    /// Key column missing or blank
    Skipped {
        line: u64,
        raw_fields: BTreeMap<String, String>,
    },
}

/// Lazy reader over a comma-delimited work list with a header row
pub struct WorkListReader<R: Read> {
    records: csv::StringRecordsIntoIter<BufReader<R>>,
    headers: Vec<String>,
    key_column: String,
    key_index: Option<usize>,
}

impl WorkListReader<File> {
    /// Open a work list file
    ///
    /// A missing file is reported as [`Error::WorkListNotFound`].
    pub fn open(path: &Path, key_column: &str) -> Result<Self> {
        tracing::debug!(path = %path.display(), key_column, "Opening work list");
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::WorkListNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_reader(file, key_column)
    }
}

impl<R: Read> WorkListReader<R> {
    /// Wrap any byte source; a leading UTF-8 byte-order mark is dropped
    pub fn from_reader(source: R, key_column: &str) -> Result<Self> {
        let mut buffered = BufReader::new(source);
        let starts_with_bom = buffered.fill_buf()?.starts_with(UTF8_BOM);
        if starts_with_bom {
            buffered.consume(UTF8_BOM.len());
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(buffered);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let key_index = headers.iter().position(|h| h == key_column);

        Ok(Self {
            records: reader.into_records(),
            headers,
            key_column: key_column.to_string(),
            key_index,
        })
    }

    /// Header names as found in the file
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether the header row names the key column at all
    pub fn has_key_column(&self) -> bool {
        self.key_index.is_some()
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    fn entry_from(&self, record: &csv::StringRecord) -> WorkListEntry {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let raw_fields: BTreeMap<String, String> = self
            .headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();

        let key = self
            .key_index
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|k| !k.is_empty());

        match key {
            Some(project_key) => WorkListEntry::Row(WorkRow {
                project_key: project_key.to_string(),
                raw_fields,
                line,
            }),
            None => WorkListEntry::Skipped { line, raw_fields },
        }
    }
}

impl<R: Read> Iterator for WorkListReader<R> {
    type Item = Result<WorkListEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map_err(Error::from).map(|r| self.entry_from(&r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(reader: WorkListReader<&[u8]>) -> Vec<Option<String>> {
        reader
            .map(|entry| match entry.unwrap() {
                WorkListEntry::Row(row) => Some(row.project_key),
                WorkListEntry::Skipped { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_rows_in_file_order() {
        let data = b"PROJECT_KEY,NAME\nPROJ1,First\nPROJ2,Second\n";
        let reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert_eq!(reader.headers(), &["PROJECT_KEY".to_string(), "NAME".to_string()]);
        assert_eq!(keys(reader), vec![Some("PROJ1".into()), Some("PROJ2".into())]);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let data = b"\xEF\xBB\xBFPROJECT_KEY\nABC\n";
        let reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert!(reader.has_key_column());
        assert_eq!(keys(reader), vec![Some("ABC".into())]);
    }

    #[test]
    fn test_blank_and_whitespace_keys_skipped() {
        let data = b"PROJECT_KEY,NAME\n,No key\n   ,Spaces\n  PROJ3 ,Padded\n";
        let reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert_eq!(keys(reader), vec![None, None, Some("PROJ3".into())]);
    }

    #[test]
    fn test_short_record_is_skipped_not_fatal() {
        let data = b"NAME,PROJECT_KEY\nOnly name\nBoth,KEY2\n";
        let reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert_eq!(keys(reader), vec![None, Some("KEY2".into())]);
    }

    #[test]
    fn test_missing_key_column_skips_every_row() {
        let data = b"KEY,NAME\nPROJ1,x\nPROJ2,y\n";
        let reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert!(!reader.has_key_column());
        assert_eq!(keys(reader), vec![None, None]);
    }

    #[test]
    fn test_skipped_entry_keeps_line_and_fields() {
        let data = b"PROJECT_KEY,NAME\n,Orphan\n";
        let mut reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        match reader.next().unwrap().unwrap() {
            WorkListEntry::Skipped { line, raw_fields } => {
                assert_eq!(line, 2);
                assert_eq!(raw_fields.get("NAME").map(String::as_str), Some("Orphan"));
            }
            other => panic!("expected skipped entry, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let data = b"PROJECT_KEY\nPROJ1\n\xFF\xFE\n";
        let mut reader = WorkListReader::from_reader(&data[..], DEFAULT_KEY_COLUMN).unwrap();

        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(reader.next().unwrap(), Err(Error::WorkList(_))));
    }

    #[test]
    fn test_missing_file_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_WORK_LIST);

        match WorkListReader::open(&path, DEFAULT_KEY_COLUMN) {
            Err(Error::WorkListNotFound(p)) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected an error"),
        }
    }
}
