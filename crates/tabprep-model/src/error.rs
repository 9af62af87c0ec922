//! Stable error codes and model parsing errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable string codes surfaced to callers as `error_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// A mandatory request key is absent.
    MissingKey,
    /// A requested field is not a column of the table.
    FieldNotFound,
    /// A transform id is not in the catalog or cannot be resolved.
    UnknownTransform,
    /// A parameter override could not be coerced or applied.
    ParameterSyntax,
    /// The transformer raised during fit or transform.
    TransformError,
    /// A field recorded in a summary is absent from new data.
    SchemaMismatch,
    /// The input dataset could not be found.
    DataNotFound,
    /// Reading or writing artifacts or outputs failed.
    StorageError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingKey => "missing-key",
            Self::FieldNotFound => "field-not-found",
            Self::UnknownTransform => "unknown-transform",
            Self::ParameterSyntax => "parameter-syntax",
            Self::TransformError => "transform-error",
            Self::SchemaMismatch => "schema-mismatch",
            Self::DataNotFound => "data-not-found",
            Self::StorageError => "storage-error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{error_type, error_msg}` pair returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error_type: ErrorCode,
    pub error_msg: String,
}

impl ErrorPayload {
    pub fn new(error_type: ErrorCode, error_msg: impl Into<String>) -> Self {
        Self {
            error_type,
            error_msg: error_msg.into(),
        }
    }
}

/// Errors raised while parsing model documents.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate transform id {0} in catalog")]
    DuplicateTransformId(u64),

    #[error("step '{field_name}' has unpaired original and encoded classes")]
    UnpairedClasses { field_name: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
