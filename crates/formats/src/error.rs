//! Error types for table reading and writing

use crate::record::Table;
use std::path::PathBuf;
use thiserror::Error;

/// Table reader/writer errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing {table} input: expected file '{}'", path.display())]
    MissingFile { table: Table, path: PathBuf },

    #[error(
        "{table} file '{}' is missing required columns {missing:?} (found {found:?})",
        path.display()
    )]
    MissingColumns {
        table: Table,
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error(
        "malformed {table} row in '{}' at line {line}: {reason} (row: {content:?})",
        path.display()
    )]
    MalformedRow {
        table: Table,
        path: PathBuf,
        line: u64,
        reason: String,
        content: String,
    },

    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an I/O failure on an output path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for format operations
pub type Result<T> = std::result::Result<T, Error>;
