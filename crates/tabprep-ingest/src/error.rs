//! Error types for table ingestion and dataset storage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or storing tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// No uploaded table exists for a dataset id.
    #[error("original data {id} not found in {dir}")]
    DatasetNotFound { id: u64, dir: PathBuf },

    /// Table file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Generic I/O failure.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be renamed over the target.
    #[error("failed to move {temp_path} to {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// File extension is not a supported table format.
    #[error("unsupported table format '{extension}': {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Polars failed to parse the table.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Index-oriented JSON could not be (de)serialized.
    #[error("invalid dataset JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Table has no rows.
    #[error("table is empty: {path}")]
    EmptyDataFrame { path: PathBuf },

    /// Table has a blank column name.
    #[error("table has an empty column name: {path}")]
    EmptyColumnName { path: PathBuf },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
