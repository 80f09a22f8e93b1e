//! Error types for the ether-dash importer.
//!
//! This module provides custom error types using `thiserror` so that every
//! failure of a rebuild carries the file, line and column it came from.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while rebuilding the store.
#[derive(Error, Debug)]
pub enum ImportError {
    /// A required input file is absent
    #[error("Missing input file: {}", .0.display())]
    MissingFile(PathBuf),

    /// The CSV reader could not parse the file structure
    #[error("CSV error in {file}: {source}")]
    Csv {
        /// File name
        file: String,
        /// Underlying reader error
        #[source]
        source: csv::Error,
    },

    /// A cell or row could not be converted to its schema type
    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        /// File name
        file: String,
        /// 1-based line in the CSV file
        line: u64,
        /// What went wrong
        message: String,
    },

    /// The header row lacks a required column
    #[error("Missing column `{column}` in {file}")]
    MissingColumn {
        /// File name
        file: String,
        /// Column name
        column: String,
    },

    /// A row has an empty primary key
    #[error("Missing primary key in {file} at line {line}")]
    MissingPrimaryKey {
        /// File name
        file: String,
        /// 1-based line in the CSV file
        line: u64,
    },

    /// Rows reference parent rows absent from the finished store
    #[error("{count} rows with dangling foreign keys, first in `{table}` referencing `{parent}`")]
    DanglingReferences {
        /// Number of offending rows
        count: usize,
        /// Child table of the first offending row
        table: String,
        /// Table it references
        parent: String,
    },

    /// Schema creation or insert failure
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ImportError {
    /// Short label used for logging and the failure metric
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingFile(_) => "missing_file",
            Self::Csv { .. } | Self::Parse { .. } | Self::MissingColumn { .. } => "parse",
            Self::MissingPrimaryKey { .. } => "missing_primary_key",
            Self::DanglingReferences { .. } => "foreign_key",
            Self::Store(_) => "store",
            Self::Io(_) => "io",
            Self::InvalidConfig(_) => "config",
        }
    }
}

/// Convenience type alias for Result with `ImportError`
pub type Result<T> = std::result::Result<T, ImportError>;
