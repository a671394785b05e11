//! Reader for headerless delimited `text<TAB>label` files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::LabeledRecord;

/// Number of columns every row must carry: text, then label.
const EXPECTED_COLUMNS: usize = 2;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path} at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        source: std::io::Error,
    },
    #[error("Malformed row at {path}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// What to do with a row that does not match the `text<sep>label` shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRows {
    /// Fail the read with [`DataLoadError::Malformed`].
    #[default]
    Abort,
    /// Log a warning and continue with the next line.
    Skip,
}

/// Source stage describing a delimited text file of labeled records.
///
/// Nothing is read until [`TextLoader::records`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLoader {
    path: PathBuf,
    separator: char,
    has_header: bool,
    malformed_rows: MalformedRows,
}

impl TextLoader {
    /// Tab-separated, headerless loader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: '\t',
            has_header: false,
            malformed_rows: MalformedRows::Abort,
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_malformed_rows(mut self, policy: MalformedRows) -> Self {
        self.malformed_rows = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Open the file and return a lazy iterator over its records.
    pub fn records(&self) -> Result<Records<BufReader<File>>, DataLoadError> {
        let file = File::open(&self.path).map_err(|source| DataLoadError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(read_records(
            BufReader::new(file),
            &self.path,
            self.separator,
            self.has_header,
            self.malformed_rows,
        ))
    }

    /// Read every record, failing on the first error.
    pub fn load_all(&self) -> Result<Vec<LabeledRecord>, DataLoadError> {
        self.records()?.collect()
    }
}

/// Build a record iterator over any buffered reader.
///
/// `source` only labels errors and warnings.
pub fn read_records<R: BufRead>(
    reader: R,
    source: &Path,
    separator: char,
    has_header: bool,
    malformed_rows: MalformedRows,
) -> Records<R> {
    Records {
        reader,
        buf: Vec::new(),
        path: source.to_path_buf(),
        separator,
        skip_header: has_header,
        malformed_rows,
        line: 0,
        failed: false,
    }
}

/// Lazy iterator of records, one per non-blank line, in file order.
///
/// Lines are read as raw bytes; a line that is not valid UTF-8 counts as a
/// malformed row, so it follows the [`MalformedRows`] policy like any other.
pub struct Records<R> {
    reader: R,
    buf: Vec<u8>,
    path: PathBuf,
    separator: char,
    skip_header: bool,
    malformed_rows: MalformedRows,
    line: usize,
    failed: bool,
}

fn parse_row(row: &str, separator: char) -> Result<LabeledRecord, String> {
    let columns: Vec<&str> = row.split(separator).collect();
    if columns.len() != EXPECTED_COLUMNS {
        return Err(format!(
            "expected {EXPECTED_COLUMNS} columns, found {}",
            columns.len()
        ));
    }
    let raw_label = columns[1].trim();
    let label = raw_label
        .parse::<f32>()
        .map_err(|_| format!("label {raw_label:?} is not a number"))?;
    Ok(LabeledRecord::new(columns[0], label))
}

/// Strip the line terminator, `\n` or `\r\n`.
fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<LabeledRecord, DataLoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(source) => {
                    self.failed = true;
                    return Some(Err(DataLoadError::Read {
                        path: self.path.clone(),
                        line: self.line + 1,
                        source,
                    }));
                }
            }
            if self.skip_header {
                self.skip_header = false;
                continue;
            }
            let parsed = match std::str::from_utf8(&self.buf) {
                Ok(line) => {
                    let row = trim_line_end(line);
                    if row.trim().is_empty() {
                        continue;
                    }
                    parse_row(row, self.separator)
                }
                Err(err) => Err(format!(
                    "row is not valid UTF-8 (bad byte at offset {})",
                    err.valid_up_to()
                )),
            };
            match parsed {
                Ok(record) => return Some(Ok(record)),
                Err(reason) => match self.malformed_rows {
                    MalformedRows::Skip => {
                        tracing::warn!(
                            "Skipping malformed row at {}:{}: {reason}",
                            self.path.display(),
                            self.line
                        );
                    }
                    MalformedRows::Abort => {
                        self.failed = true;
                        return Some(Err(DataLoadError::Malformed {
                            path: self.path.clone(),
                            line: self.line,
                            reason,
                        }));
                    }
                },
            }
        }
    }
}
