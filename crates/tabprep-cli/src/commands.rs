//! Subcommand implementations, independent of argument parsing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde_json::Value;
use tracing::info_span;

use tabprep_common::series_to_json;
use tabprep_core::{
    ArtifactStore, DatasetProfile, DatasetProfiler, JobRecordUpdate, PipelineConfig,
    PipelineContext, PipelinePreviewer, PipelineReplayer, PreviewStep, run_fit_job,
};
use tabprep_ingest::{read_original, read_table, write_index_json};
use tabprep_model::{Summary, TransformCatalog};
use tabprep_transform::default_registry;

/// Configuration and catalog shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: PipelineConfig,
    pub catalog: TransformCatalog,
}

impl Workspace {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("load configuration {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        Self::from_config(config)
    }

    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let catalog = config.catalog().context("load transform catalog")?;
        Ok(Self { config, catalog })
    }

    fn context(&self) -> PipelineContext<'_> {
        PipelineContext::new(default_registry(), &self.catalog)
    }
}

/// Inputs of a replay run.
#[derive(Debug, Clone, Copy)]
pub struct ReplayInput<'a> {
    pub summary: &'a Path,
    pub table: &'a Path,
    pub output: Option<&'a Path>,
    pub target: Option<&'a str>,
    pub predictions: Option<&'a Path>,
}

/// What a replay run produced.
#[derive(Debug)]
pub struct ReplayReport {
    pub table: DataFrame,
    pub steps: usize,
    pub output: Option<PathBuf>,
    /// Target transform name and the inverted predictions.
    pub inverse: Option<(String, Vec<Value>)>,
}

pub fn run_fit(workspace: &Workspace, job_id: u64, request: &Path) -> Result<JobRecordUpdate> {
    let span = info_span!("fit", job_id);
    let _guard = span.enter();
    let raw = read_json(request)?;
    Ok(run_fit_job(workspace.context(), &workspace.config, job_id, &raw))
}

pub fn run_preview(
    workspace: &Workspace,
    dataset_id: u64,
    request: &Path,
    rows: Option<usize>,
) -> Result<Vec<PreviewStep>> {
    let span = info_span!("preview", dataset_id);
    let _guard = span.enter();
    let raw = read_json(request)?;
    let table = read_original(&workspace.config.original_data_dir, dataset_id)?;
    let rows = rows.unwrap_or(workspace.config.preview_rows);
    let steps = PipelinePreviewer::new(workspace.context(), rows).preview_raw(&raw, &table)?;
    Ok(steps)
}

pub fn run_replay(workspace: &Workspace, input: ReplayInput<'_>) -> Result<ReplayReport> {
    let span = info_span!("replay", summary = %input.summary.display());
    let _guard = span.enter();
    let summary = load_summary(input.summary)?;
    let table = read_table(input.table)?;
    let artifacts = ArtifactStore::new(&workspace.config.artifact_dir);
    let outcome = PipelineReplayer::new(default_registry(), &artifacts)
        .replay(table, &summary, input.target)?;

    let inverse = match input.predictions {
        Some(path) => {
            let Some(target) = &outcome.target else {
                bail!(
                    "target '{}' is not transformed by the summary",
                    input.target.unwrap_or_default()
                );
            };
            let values: Vec<f64> = serde_json::from_value(read_json(path)?)
                .with_context(|| format!("parse predictions {}", path.display()))?;
            let column = target.inverse_predictions(&Array1::from(values))?;
            let restored = series_to_json(&column.to_series(&target.field_name))?;
            Some((target.function_name().to_string(), restored))
        }
        None => None,
    };

    if let Some(path) = input.output {
        write_index_json(&outcome.table, path)?;
    }
    Ok(ReplayReport {
        table: outcome.table,
        steps: summary.len(),
        output: input.output.map(Path::to_path_buf),
        inverse,
    })
}

pub fn run_profile(table: &Path) -> Result<DatasetProfile> {
    let df = read_table(table)?;
    DatasetProfiler::profile(&df).with_context(|| format!("profile {}", table.display()))
}

/// Write a job-record update as pretty JSON.
pub fn write_record(update: &JobRecordUpdate, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(update).context("serialize job record")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

/// Accepts either a bare step list or a job-record update with a `summary` key.
fn load_summary(path: &Path) -> Result<Summary> {
    let value = match read_json(path)? {
        Value::Object(mut record) => match record.remove("summary") {
            Some(summary) => summary,
            None => bail!("{} has no summary", path.display()),
        },
        other => other,
    };
    serde_json::from_value(value).with_context(|| format!("parse summary {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
