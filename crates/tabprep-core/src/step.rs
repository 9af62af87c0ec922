//! Per-field step mechanics shared by fit and preview runs.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde_json::Value;
use tabprep_model::{ClassVocabulary, TransformDescriptor};
use tabprep_transform::{
    Category, ColumnShape, TransformError, TransformOutput, Transformer, TransformerRegistry,
    apply_overrides, classify, read_column,
};

use crate::error::PipelineError;

/// A transformer fitted on one field, with its output and integration category.
pub(crate) struct FittedStep {
    pub transformer: Box<dyn Transformer>,
    pub output: TransformOutput,
    pub category: Category,
    pub vocabulary: Option<ClassVocabulary>,
}

/// Wrap a transform failure with the step it happened in, and log it.
pub(crate) fn step_error(field: &str, function: &str, source: TransformError) -> PipelineError {
    tracing::error!(field, function, error = %source, "step failed");
    PipelineError::transform(field, function, source)
}

/// Resolve, configure and fit a transformer on `field`, then classify the output.
pub(crate) fn fit_field(
    registry: &TransformerRegistry,
    descriptor: &TransformDescriptor,
    overrides: Option<&BTreeMap<String, Value>>,
    table: &DataFrame,
    field: &str,
) -> Result<FittedStep, PipelineError> {
    let function = descriptor.function_name.as_str();
    let fail = |source| step_error(field, function, source);

    let mut transformer = registry.resolve(descriptor).map_err(fail)?;
    if let Some(overrides) = overrides {
        apply_overrides(transformer.as_mut(), overrides).map_err(fail)?;
    }
    let input = read_column(table, field).map_err(fail)?;
    let output = transformer.fit_transform(&input).map_err(fail)?;
    let category = classify(function, ColumnShape::of(&input), &output).map_err(fail)?;
    let vocabulary = match category {
        Category::NoOp => None,
        _ => transformer.class_vocabulary(&input),
    };

    if category == Category::NoOp {
        tracing::warn!(field, function, "single-column output of this transform is not applied");
    } else {
        tracing::info!(field, function, category = %category, "fitted step");
    }
    Ok(FittedStep {
        transformer,
        output,
        category,
        vocabulary,
    })
}
