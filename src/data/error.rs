use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors: fatal for the session
// ---------------------------------------------------------------------------

/// Failure to read either input file. A session cannot start without both.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("malformed Parquet in {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },

    #[error("cannot decode Parquet batch in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        source: arrow::error::ArrowError,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': {reason} (got '{value}')")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("duplicate customer id '{0}'")]
    DuplicateCustomer(String),
}

// ---------------------------------------------------------------------------
// Filter errors: local to one request
// ---------------------------------------------------------------------------

/// Rejection of a single filter request. The session stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("invalid CLV range: minimum {min} is greater than maximum {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("no customer records are loaded")]
    EmptyInput,
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush export: {0}")]
    Io(#[from] std::io::Error),
}
