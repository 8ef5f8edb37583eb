//! Streaming CSV table reader
//!
//! Reads a MovieLens table row by row into typed records. Columns are
//! located by header name, so extra or reordered columns are tolerated,
//! while a missing required column fails before any row is read.

use crate::record::{Table, TableRow};
use crate::{Error, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::{self, Read};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Report progress to the callback every this many rows
const PROGRESS_INTERVAL: usize = 10_000;

/// Streaming reader yielding typed rows of one table
pub struct TableReader<R: Read, T: TableRow> {
    reader: csv::Reader<R>,
    path: PathBuf,
    /// Position of each required column within the source header
    column_index: Vec<usize>,
    header_len: usize,
    record: ByteRecord,
    rows_read: usize,
    total_bytes: Option<u64>,
    _row: PhantomData<T>,
}

impl<T: TableRow> TableReader<File, T> {
    /// Open a table file, failing with [`Error::MissingFile`] if it is absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MissingFile {
                    table: T::TABLE,
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let total_bytes = file.metadata()?.len();

        debug!("Opening {} table: {:?} ({} bytes)", T::TABLE, path, total_bytes);
        Self::with_source(file, path.to_path_buf(), Some(total_bytes))
    }
}

impl<R: Read, T: TableRow> TableReader<R, T> {
    /// Read a table from any source (header row required)
    pub fn new(reader: R) -> Result<Self> {
        Self::with_source(reader, PathBuf::from("<memory>"), None)
    }

    fn with_source(reader: R, path: PathBuf, total_bytes: Option<u64>) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = match reader.headers() {
            Ok(headers) => headers,
            Err(e) => return Err(csv_error::<T>(&path, e)),
        };
        let found: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let table = T::TABLE;
        let mut column_index = Vec::with_capacity(table.columns().len());
        let mut missing = Vec::new();
        for column in table.columns() {
            match found.iter().position(|h| h == column) {
                Some(idx) => column_index.push(idx),
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingColumns {
                table,
                path,
                missing,
                found,
            });
        }

        Ok(Self {
            reader,
            path,
            column_index,
            header_len: found.len(),
            record: ByteRecord::new(),
            rows_read: 0,
            total_bytes,
            _row: PhantomData,
        })
    }

    /// Path this reader was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows read so far
    pub fn rows_processed(&self) -> usize {
        self.rows_read
    }

    /// Bytes consumed from the source so far
    pub fn bytes_processed(&self) -> u64 {
        self.reader.position().byte()
    }

    /// Total file size if known
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    fn malformed(&self, reason: String) -> Error {
        Error::MalformedRow {
            table: T::TABLE,
            path: self.path.clone(),
            line: self.record.position().map(|p| p.line()).unwrap_or(0),
            reason,
            content: self
                .record
                .iter()
                .map(String::from_utf8_lossy)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl<R: Read, T: TableRow> Iterator for TableReader<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.rows_read += 1;

                if self.record.len() != self.header_len {
                    let reason = format!(
                        "expected {} fields, found {}",
                        self.header_len,
                        self.record.len()
                    );
                    return Some(Err(self.malformed(reason)));
                }

                let mut fields = Vec::with_capacity(self.column_index.len());
                for (&idx, column) in self.column_index.iter().zip(T::TABLE.columns()) {
                    match std::str::from_utf8(&self.record[idx]) {
                        Ok(field) => fields.push(field),
                        Err(_) => {
                            let reason = format!("{} is not valid UTF-8", column);
                            return Some(Err(self.malformed(reason)));
                        }
                    }
                }

                match T::from_fields(&fields) {
                    Ok(row) => Some(Ok(row)),
                    Err(reason) => Some(Err(self.malformed(reason))),
                }
            }
            Err(e) => Some(Err(csv_error::<T>(&self.path, e))),
        }
    }
}

/// Attach table and location to a csv-level failure; I/O errors pass through
fn csv_error<T: TableRow>(path: &Path, error: csv::Error) -> Error {
    let line = error.position().map(|p| p.line()).unwrap_or(1);
    let reason = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(e) => Error::Io(e),
        _ => Error::MalformedRow {
            table: T::TABLE,
            path: path.to_path_buf(),
            line,
            reason,
            content: String::new(),
        },
    }
}

/// Load a whole table into memory
pub fn load_table<T: TableRow, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    load_table_with_progress(path, |_| {})
}

/// Load a whole table, reporting the running row count periodically and once at the end
pub fn load_table_with_progress<T, P, F>(path: P, mut on_progress: F) -> Result<Vec<T>>
where
    T: TableRow,
    P: AsRef<Path>,
    F: FnMut(usize),
{
    let mut reader = TableReader::<File, T>::open(path)?;
    let mut rows = Vec::new();

    for row in reader.by_ref() {
        rows.push(row?);
        if rows.len() % PROGRESS_INTERVAL == 0 {
            on_progress(rows.len());
        }
    }
    on_progress(rows.len());

    debug!(
        "Loaded {} {} rows from {:?} ({} bytes)",
        rows.len(),
        T::TABLE,
        reader.path(),
        reader.bytes_processed()
    );

    Ok(rows)
}

/// Open a table with the row type matching `table` and count its rows
pub fn count_rows<P: AsRef<Path>>(table: Table, path: P) -> Result<usize> {
    use crate::record::{Link, Movie, Rating, Tag};

    fn count<T: TableRow>(path: &Path) -> Result<usize> {
        let mut total = 0;
        for row in TableReader::<File, T>::open(path)? {
            row?;
            total += 1;
        }
        Ok(total)
    }

    let path = path.as_ref();
    match table {
        Table::Ratings => count::<Rating>(path),
        Table::Movies => count::<Movie>(path),
        Table::Tags => count::<Tag>(path),
        Table::Links => count::<Link>(path),
    }
}
