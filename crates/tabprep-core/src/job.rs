//! Fit job wrapper producing the update for the owning job record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tabprep_model::{ErrorPayload, Summary};

use crate::artifacts::ArtifactStore;
use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::profile::{DatasetProfile, DatasetProfiler};
use crate::runner::{FitOutcome, PipelineRunner};

/// Final state of a fit job, written back to its job record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobRecordUpdate {
    Success {
        job_id: u64,
        finished_at: DateTime<Utc>,
        file_name: String,
        file_path: PathBuf,
        summary: Summary,
        #[serde(flatten)]
        profile: DatasetProfile,
    },
    Fail {
        job_id: u64,
        finished_at: DateTime<Utc>,
        error: ErrorPayload,
    },
}

impl JobRecordUpdate {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Run one fit job end to end. Failures are reported in the update, never raised.
pub fn run_fit_job(
    context: PipelineContext<'_>,
    config: &PipelineConfig,
    job_id: u64,
    raw_request: &Value,
) -> JobRecordUpdate {
    tracing::info!(job_id, "fit job started");
    let runner = PipelineRunner::new(
        context,
        ArtifactStore::new(&config.artifact_dir),
        &config.output_dir,
    );
    let result = runner
        .run_request(job_id, raw_request, &config.original_data_dir)
        .and_then(profile_outcome);

    match result {
        Ok((outcome, profile)) => JobRecordUpdate::Success {
            job_id,
            finished_at: Utc::now(),
            file_name: outcome.file_name,
            file_path: outcome.file_path,
            summary: outcome.summary,
            profile,
        },
        Err(e) => {
            tracing::error!(job_id, code = %e.code(), error = %e, "fit job marked failed");
            JobRecordUpdate::Fail {
                job_id,
                finished_at: Utc::now(),
                error: e.payload(),
            }
        }
    }
}

fn profile_outcome(outcome: FitOutcome) -> Result<(FitOutcome, DatasetProfile)> {
    let profile = DatasetProfiler::profile(&outcome.table)?;
    Ok((outcome, profile))
}
