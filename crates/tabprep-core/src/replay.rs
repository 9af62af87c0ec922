//! Replay mode: apply a recorded summary to new data with the fitted artifacts.
//!
//! Transformers are never refitted. The integration category of each step is
//! derived again from the replayed output, so replaying the fit input
//! reproduces the fitted table column for column.

use ndarray::Array1;
use polars::prelude::DataFrame;
use tabprep_model::{StepRecord, Summary};
use tabprep_transform::{
    ColumnData, ColumnShape, TransformError, TransformOutput, Transformer, TransformerRegistry,
    classify, drop_field, integrate, read_column,
};

use crate::artifacts::ArtifactStore;
use crate::error::{PipelineError, Result};
use crate::step::step_error;

/// The fitted transformer of the prediction target column.
pub struct TargetTransformer {
    pub field_name: String,
    transformer: Box<dyn Transformer>,
}

impl std::fmt::Debug for TargetTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetTransformer")
            .field("field_name", &self.field_name)
            .field("transformer", &self.transformer.name())
            .finish()
    }
}

impl TargetTransformer {
    pub fn function_name(&self) -> &'static str {
        self.transformer.name()
    }

    /// Undo the target encoding on predicted or real values.
    ///
    /// The rank-1 form is tried first; on failure the values are retried as a
    /// single column.
    pub fn inverse_predictions(&self, values: &Array1<f64>) -> Result<ColumnData> {
        let function = self.transformer.name();
        match self
            .transformer
            .inverse_transform(&TransformOutput::Vector(values.clone()))
        {
            Ok(column) => Ok(column),
            Err(e @ TransformError::NotInvertible { .. }) => {
                Err(step_error(&self.field_name, function, e))
            }
            Err(e) => {
                tracing::debug!(function, error = %e, "retrying inverse with column form");
                self.transformer
                    .inverse_transform(&TransformOutput::column(values.clone()))
                    .map_err(|e| step_error(&self.field_name, function, e))
            }
        }
    }
}

/// Replayed table and the target transformer, if the target was transformed.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub table: DataFrame,
    pub target: Option<TargetTransformer>,
}

/// Replays summaries against new tables.
#[derive(Debug, Clone, Copy)]
pub struct PipelineReplayer<'a> {
    registry: &'a TransformerRegistry,
    artifacts: &'a ArtifactStore,
}

impl<'a> PipelineReplayer<'a> {
    pub fn new(registry: &'a TransformerRegistry, artifacts: &'a ArtifactStore) -> Self {
        Self {
            registry,
            artifacts,
        }
    }

    /// Apply every step of `summary` to `table` in order.
    ///
    /// `target` names the prediction target column; the last transform step
    /// applied to it is returned for inverting predictions.
    pub fn replay(
        &self,
        mut table: DataFrame,
        summary: &Summary,
        target: Option<&str>,
    ) -> Result<ReplayOutcome> {
        let mut target_transformer = None;
        for step in summary {
            if table.get_column_index(&step.field_name).is_none() {
                tracing::error!(field = %step.field_name, "replayed field is missing");
                return Err(PipelineError::SchemaMismatch {
                    field: step.field_name.clone(),
                });
            }
            if step.is_drop() {
                drop_field(&mut table, &step.field_name)
                    .map_err(|e| step_error(&step.field_name, &step.function_name, e))?;
                tracing::info!(field = %step.field_name, "replayed column removal");
                continue;
            }

            let transformer = self.replay_step(&mut table, step)?;
            if target == Some(step.field_name.as_str()) {
                target_transformer = Some(TargetTransformer {
                    field_name: step.field_name.clone(),
                    transformer,
                });
            }
        }
        Ok(ReplayOutcome {
            table,
            target: target_transformer,
        })
    }

    fn replay_step(
        &self,
        table: &mut DataFrame,
        step: &StepRecord,
    ) -> Result<Box<dyn Transformer>> {
        let field = step.field_name.as_str();
        let function = step.function_name.as_str();
        let file_name = step
            .artifact_file_name
            .as_deref()
            .ok_or_else(|| PipelineError::MissingArtifact {
                field: field.to_string(),
            })?;
        let fail = |source| step_error(field, function, source);

        let transformer = self
            .artifacts
            .read(file_name)?
            .restore(self.registry)
            .map_err(fail)?;
        let input = read_column(table, field).map_err(fail)?;
        let output = transformer.transform(&input).map_err(fail)?;
        let category = classify(function, ColumnShape::of(&input), &output).map_err(fail)?;
        integrate(table, field, category, &output).map_err(fail)?;
        tracing::info!(
            field,
            function,
            artifact = file_name,
            category = %category,
            "replayed step"
        );
        Ok(transformer)
    }
}
