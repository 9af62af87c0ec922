//! Fit mode: apply a request to a whole table and commit the result.
//!
//! A run walks the field requests in order, threading a [`FitState`] through
//! every step. Each transform step persists its fitted artifact as
//! `T_<job>_<n>.json`. The transformed table is written as `P_<job>.json`
//! only after every step succeeded; on failure the artifacts written so far
//! are removed and nothing else is kept.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use serde_json::Value;
use tabprep_ingest::{read_original, transformed_file_name, write_index_json};
use tabprep_model::{
    DROP_COLUMNS, FieldRequest, FitRequest, StepRecord, Summary, TransformDescriptor,
};
use tabprep_transform::{drop_field, integrate};

use crate::artifacts::{ArtifactRecord, ArtifactStore, artifact_file_name};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::inspect::{check_fields, inspect_fit};
use crate::step::{fit_field, step_error};

/// Result of a committed fit run.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub summary: Summary,
    pub table: DataFrame,
    pub file_name: String,
    pub file_path: PathBuf,
}

/// Accumulator threaded through the steps of one run.
#[derive(Debug)]
struct FitState {
    table: DataFrame,
    summary: Summary,
    sequence: usize,
}

/// Runs fit requests and persists their artifacts and output.
#[derive(Debug, Clone)]
pub struct PipelineRunner<'a> {
    context: PipelineContext<'a>,
    artifacts: ArtifactStore,
    output_dir: PathBuf,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        context: PipelineContext<'a>,
        artifacts: ArtifactStore,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context,
            artifacts,
            output_dir: output_dir.into(),
        }
    }

    /// Inspect a raw request, load its original table and run it.
    pub fn run_request(
        &self,
        job_id: u64,
        raw: &Value,
        original_dir: &Path,
    ) -> Result<FitOutcome> {
        let request = inspect_fit(raw, self.context.catalog)?;
        let table = read_original(original_dir, request.original_data_id)?;
        tracing::info!(
            job_id,
            original_data_id = request.original_data_id,
            rows = table.height(),
            columns = table.width(),
            "loaded original data"
        );
        self.run(job_id, &request, table)
    }

    /// Apply every field request to `table` in order.
    ///
    /// A request naming a missing field is rejected before any step runs and
    /// leaves the artifact directory untouched. Otherwise the run fails on the
    /// first failing step. No output file is written then, and the job's
    /// artifacts are removed.
    pub fn run(&self, job_id: u64, request: &FitRequest, table: DataFrame) -> Result<FitOutcome> {
        check_fields(&request.request_data, &table).inspect_err(|e| {
            tracing::error!(job_id, error = %e, "fit request rejected");
        })?;
        let outcome = request
            .request_data
            .iter()
            .try_fold(FitState::new(table), |state, field_request| {
                self.apply_request(job_id, state, field_request)
            })
            .and_then(|state| self.commit(job_id, state));

        match outcome {
            Ok(outcome) => {
                tracing::info!(
                    job_id,
                    steps = outcome.summary.len(),
                    path = %outcome.file_path.display(),
                    "fit job finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(job_id, error = %e, "fit job failed");
                self.artifacts.remove_job(job_id);
                Err(e)
            }
        }
    }

    fn apply_request(
        &self,
        job_id: u64,
        state: FitState,
        request: &FieldRequest,
    ) -> Result<FitState> {
        let descriptor = self.context.descriptor(request.transform_id)?;
        request
            .field_names()
            .iter()
            .try_fold(state, |state, field| {
                self.apply_field(job_id, state, request, descriptor, field)
            })
    }

    fn apply_field(
        &self,
        job_id: u64,
        mut state: FitState,
        request: &FieldRequest,
        descriptor: &TransformDescriptor,
        field: &str,
    ) -> Result<FitState> {
        if descriptor.is_drop_columns() {
            drop_field(&mut state.table, field).map_err(|e| step_error(field, DROP_COLUMNS, e))?;
            tracing::info!(job_id, field, "dropped column");
            state
                .summary
                .push(StepRecord::dropped(field, request.transform_id));
            return Ok(state);
        }

        let function = descriptor.function_name.as_str();
        let step = fit_field(
            self.context.registry,
            descriptor,
            request.parameter_overrides.as_ref(),
            &state.table,
            field,
        )?;
        integrate(&mut state.table, field, step.category, &step.output)
            .map_err(|e| step_error(field, function, e))?;

        state.sequence += 1;
        let file_name = artifact_file_name(job_id, state.sequence);
        let record = ArtifactRecord::capture(descriptor, step.transformer.as_ref())
            .map_err(|e| step_error(field, function, e))?;
        self.artifacts.save(&file_name, &record)?;

        state.summary.push(StepRecord::fitted(
            field,
            function,
            request.transform_id,
            file_name,
            step.vocabulary,
        ));
        Ok(state)
    }

    fn commit(&self, job_id: u64, state: FitState) -> Result<FitOutcome> {
        let file_name = transformed_file_name(job_id);
        let file_path = self.output_dir.join(&file_name);
        write_index_json(&state.table, &file_path)?;
        Ok(FitOutcome {
            summary: state.summary,
            table: state.table,
            file_name,
            file_path,
        })
    }
}

impl FitState {
    fn new(table: DataFrame) -> Self {
        Self {
            table,
            summary: Summary::new(),
            sequence: 0,
        }
    }
}
