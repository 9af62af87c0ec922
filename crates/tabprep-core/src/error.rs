//! Pipeline errors and their mapping onto stable caller-facing codes.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use tabprep_ingest::IngestError;
use tabprep_model::{ErrorCode, ErrorPayload, ModelError};
use tabprep_transform::TransformError;
use thiserror::Error;

/// Errors raised by fit, preview and replay runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    // === Request Errors ===
    /// A mandatory request key is absent.
    #[error("missing mandatory key '{key}'")]
    MissingKey { key: String },

    /// The request body has the right keys but the wrong types.
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] ModelError),

    /// A requested field is not a column of the table.
    #[error("field '{field}' does not exist")]
    FieldNotFound { field: String },

    /// A transform id is not in the catalog.
    #[error("transform id {transform_id} is not in the catalog")]
    UnknownTransformId { transform_id: u64 },

    // === Step Errors ===
    /// A step failed while resolving, configuring, fitting or integrating.
    #[error("{function} on '{field}': {source}")]
    Transform {
        field: String,
        function: String,
        #[source]
        source: TransformError,
    },

    /// A field recorded in a summary is absent from the replayed table.
    #[error("field '{field}' recorded in the summary is missing from the data")]
    SchemaMismatch { field: String },

    /// A transform step in a summary carries no artifact file name.
    #[error("step for '{field}' has no artifact")]
    MissingArtifact { field: String },

    /// A summary step names an artifact that is not in the store.
    #[error("artifact {file_name} not found in {dir}")]
    ArtifactNotFound { file_name: String, dir: PathBuf },

    // === Storage Errors ===
    /// Dataset loading or storing failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Artifact file I/O failed.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact contents could not be (de)serialized.
    #[error("invalid artifact {path}: {source}")]
    ArtifactJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be parsed.
    #[error("invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Catalog file could not be parsed.
    #[error("invalid catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// Failed DataFrame operation.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl PipelineError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn transform(
        field: impl Into<String>,
        function: impl Into<String>,
        source: TransformError,
    ) -> Self {
        Self::Transform {
            field: field.into(),
            function: function.into(),
            source,
        }
    }

    /// Stable code reported to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingKey { .. } | Self::InvalidRequest(_) => ErrorCode::MissingKey,
            Self::FieldNotFound { .. } => ErrorCode::FieldNotFound,
            Self::UnknownTransformId { .. } => ErrorCode::UnknownTransform,
            Self::Transform { source, .. } => match source {
                TransformError::ParameterSyntax { .. } => ErrorCode::ParameterSyntax,
                TransformError::UnknownTransform { .. } => ErrorCode::UnknownTransform,
                TransformError::ColumnNotFound { .. } => ErrorCode::FieldNotFound,
                _ => ErrorCode::TransformError,
            },
            Self::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::Ingest(IngestError::DatasetNotFound { .. } | IngestError::FileNotFound { .. }) => {
                ErrorCode::DataNotFound
            }
            Self::MissingArtifact { .. }
            | Self::ArtifactNotFound { .. }
            | Self::Ingest(_)
            | Self::Io { .. }
            | Self::ArtifactJson { .. }
            | Self::Config { .. }
            | Self::Catalog { .. }
            | Self::Polars(_) => ErrorCode::StorageError,
        }
    }

    /// The `{error_type, error_msg}` pair for this error.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.code(), self.to_string())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
