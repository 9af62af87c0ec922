//! Test mode: dry-run transforms on the first rows of a table.
//!
//! Nothing is persisted. Transforms are fitted on a head-sized copy and never
//! written back to it; only `DropColumns` changes the copy so that later steps
//! see the columns as a committed run would.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabprep_common::{format_numeric, round_to};
use tabprep_model::{DROP_COLUMNS, FieldRequest, PreviewRequest, TransformDescriptor};
use tabprep_transform::{Category, TransformOutput, drop_field};

use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::inspect::{check_fields, inspect_preview};
use crate::step::{fit_field, step_error};

/// Placeholder shown for every row of a dropped column.
const DROPPED_CELL: &str = " ";

/// Upper bound on previewed rows, whatever the configuration asks for.
pub const MAX_PREVIEW_ROWS: usize = 5;

/// One previewed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewValue {
    Number(f64),
    Text(String),
}

/// Preview of one transform on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStep {
    pub field_name: String,
    pub function_name: String,
    /// The requested overrides, if any.
    pub function_parameter: Option<BTreeMap<String, Value>>,
    /// Row index to transformed value.
    pub test_result: BTreeMap<usize, PreviewValue>,
}

/// Runs preview requests.
#[derive(Debug, Clone, Copy)]
pub struct PipelinePreviewer<'a> {
    context: PipelineContext<'a>,
    preview_rows: usize,
}

impl<'a> PipelinePreviewer<'a> {
    /// `preview_rows` is capped at [`MAX_PREVIEW_ROWS`].
    pub fn new(context: PipelineContext<'a>, preview_rows: usize) -> Self {
        if preview_rows > MAX_PREVIEW_ROWS {
            tracing::warn!(
                requested = preview_rows,
                cap = MAX_PREVIEW_ROWS,
                "preview row count capped"
            );
        }
        Self {
            context,
            preview_rows: preview_rows.min(MAX_PREVIEW_ROWS),
        }
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Inspect a raw request and preview it against `table`.
    pub fn preview_raw(&self, raw: &Value, table: &DataFrame) -> Result<Vec<PreviewStep>> {
        let request = inspect_preview(raw, self.context.catalog)?;
        self.preview(&request, table)
    }

    /// Preview every field request in order. The first failure is returned
    /// instead of any result.
    ///
    /// Every fanned-out field must exist in `table` before any transform runs;
    /// fields dropped by an earlier step of the batch fail when reached.
    pub fn preview(
        &self,
        request: &PreviewRequest,
        table: &DataFrame,
    ) -> Result<Vec<PreviewStep>> {
        check_fields(&request.request_test, table)?;
        let sample = table.head(Some(self.preview_rows));
        let (_, steps) = request.request_test.iter().try_fold(
            (sample, Vec::new()),
            |(sample, steps), field_request| self.preview_request(sample, steps, field_request),
        )?;
        Ok(steps)
    }

    fn preview_request(
        &self,
        sample: DataFrame,
        steps: Vec<PreviewStep>,
        request: &FieldRequest,
    ) -> Result<(DataFrame, Vec<PreviewStep>)> {
        let descriptor = self.context.descriptor(request.transform_id)?;
        request
            .field_names()
            .into_iter()
            .try_fold((sample, steps), |(sample, mut steps), field| {
                if sample.get_column_index(&field).is_none() {
                    tracing::error!(field = %field, "previewed field does not exist");
                    return Err(PipelineError::FieldNotFound { field });
                }
                let (sample, step) = self.preview_field(sample, request, descriptor, field)?;
                steps.push(step);
                Ok((sample, steps))
            })
    }

    fn preview_field(
        &self,
        mut sample: DataFrame,
        request: &FieldRequest,
        descriptor: &TransformDescriptor,
        field: String,
    ) -> Result<(DataFrame, PreviewStep)> {
        if descriptor.is_drop_columns() {
            drop_field(&mut sample, &field).map_err(|e| step_error(&field, DROP_COLUMNS, e))?;
            tracing::info!(field = %field, "previewing column removal");
            let test_result = (0..self.preview_rows)
                .map(|row| (row, PreviewValue::Text(DROPPED_CELL.to_string())))
                .collect();
            let step = PreviewStep {
                field_name: field,
                function_name: DROP_COLUMNS.to_string(),
                function_parameter: None,
                test_result,
            };
            return Ok((sample, step));
        }

        let fitted = fit_field(
            self.context.registry,
            descriptor,
            request.parameter_overrides.as_ref(),
            &sample,
            &field,
        )?;
        let step = PreviewStep {
            field_name: field,
            function_name: descriptor.function_name.clone(),
            function_parameter: request.parameter_overrides.clone(),
            test_result: render(fitted.category, &fitted.output, self.preview_rows),
        };
        Ok((sample, step))
    }
}

/// Render the first `limit` rows of an output for display.
///
/// Single-column outputs stay numeric, encoded labels become strings and
/// multi-column rows are shown as `[a, b, c]`.
fn render(
    category: Category,
    output: &TransformOutput,
    limit: usize,
) -> BTreeMap<usize, PreviewValue> {
    let dense = output.to_dense();
    dense
        .rows()
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, row)| {
            let value = match category {
                Category::OverwriteScalar | Category::NoOp => {
                    PreviewValue::Number(round_to(row[0], 4))
                }
                Category::EncodeScalar => PreviewValue::Text(format_numeric(row[0])),
                Category::ExpandColumns { .. } => {
                    let cells: Vec<String> = row.iter().map(|v| format_numeric(*v)).collect();
                    PreviewValue::Text(format!("[{}]", cells.join(", ")))
                }
            };
            (index, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_render_rounds_scalars() {
        let output = TransformOutput::Matrix(array![[0.123_456], [1.0]]);
        let rendered = render(Category::OverwriteScalar, &output, 5);
        assert_eq!(rendered[&0], PreviewValue::Number(0.1235));
        assert_eq!(rendered[&1], PreviewValue::Number(1.0));
    }

    #[test]
    fn test_render_encoded_labels_as_text() {
        let output = TransformOutput::Vector(array![1.0, 0.0, 2.0]);
        let rendered = render(Category::EncodeScalar, &output, 2);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[&0], PreviewValue::Text("1".to_string()));
    }

    #[test]
    fn test_render_expanded_rows() {
        let output = TransformOutput::Matrix(array![[1.0, 0.0, 0.0], [0.0, 0.5, 0.0]]);
        let rendered = render(Category::ExpandColumns { width: 3 }, &output, 5);
        assert_eq!(rendered[&0], PreviewValue::Text("[1, 0, 0]".to_string()));
        assert_eq!(rendered[&1], PreviewValue::Text("[0, 0.5, 0]".to_string()));
    }
}
