//! Error types for transformers and column integration.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while configuring, fitting or applying transformers.
#[derive(Debug, Error)]
pub enum TransformError {
    // === Parameter Errors ===
    /// A parameter override could not be coerced or assigned.
    #[error("cannot set parameter '{name}' to '{value}'")]
    ParameterSyntax { name: String, value: String },

    /// A parameter value is well-typed but out of range for the transformer.
    #[error("{transformer}: invalid value for '{name}': {reason}")]
    InvalidParameter {
        transformer: &'static str,
        name: String,
        reason: String,
    },

    // === Resolution Errors ===
    /// No factory is registered for a descriptor.
    #[error("no transformer registered for {qualified_name}")]
    UnknownTransform { qualified_name: String },

    /// A persisted transformer state could not be decoded.
    #[error("invalid {transformer} state: {source}")]
    State {
        transformer: String,
        #[source]
        source: serde_json::Error,
    },

    // === Fit / Transform Errors ===
    /// The transformer needs numeric input but got text.
    #[error("{transformer} requires numeric input")]
    NonNumeric { transformer: &'static str },

    /// The input contains missing values the transformer cannot handle.
    #[error("{transformer} does not accept missing values")]
    MissingValues { transformer: &'static str },

    /// The transformer cannot be fitted on zero rows.
    #[error("{transformer} cannot be fitted on empty input")]
    EmptyInput { transformer: &'static str },

    /// A value was not seen during fit.
    #[error("{transformer} found unknown label '{label}'")]
    UnseenLabel {
        transformer: &'static str,
        label: String,
    },

    /// `transform` called before `fit_transform`.
    #[error("{transformer} is not fitted yet")]
    NotFitted { transformer: &'static str },

    /// The transformer has no inverse.
    #[error("{transformer} does not support inverse_transform")]
    NotInvertible { transformer: &'static str },

    /// An encoded input has the wrong number of columns.
    #[error("{transformer} expected {expected} columns, got {got}")]
    WidthMismatch {
        transformer: &'static str,
        expected: usize,
        got: usize,
    },

    // === Integration Errors ===
    /// Output row count differs from the source column.
    #[error("transform produced {got} rows for a column of {expected} rows")]
    RowMismatch { expected: usize, got: usize },

    /// The target column is not in the table.
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// An expansion column would overwrite an existing column.
    #[error("column '{column}' already exists")]
    DuplicateColumn { column: String },

    /// Failed DataFrame operation.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
