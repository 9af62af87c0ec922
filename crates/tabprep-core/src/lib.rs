//! Fit, preview and replay pipelines.
//!
//! - **runner**: committed runs that persist artifacts and the transformed table
//! - **preview**: dry runs on the first rows, nothing persisted
//! - **replay**: recorded summaries applied to new data with fitted artifacts
//! - **profile**: descriptive statistics of original and transformed tables
//! - **job**: fit job wrapper producing the job-record update
//!
//! # Example
//!
//! ```ignore
//! use tabprep_core::{PipelineContext, PipelineRunner, ArtifactStore};
//! use tabprep_transform::{default_catalog, default_registry};
//!
//! let catalog = default_catalog();
//! let context = PipelineContext::new(default_registry(), &catalog);
//! let runner = PipelineRunner::new(context, ArtifactStore::new("artifacts"), "output");
//! let outcome = runner.run(7, &request, table)?;
//! ```

pub mod artifacts;
pub mod config;
mod context;
pub mod error;
pub mod inspect;
pub mod job;
pub mod preview;
pub mod profile;
pub mod replay;
pub mod runner;
mod step;

// === Errors ===
pub use error::{PipelineError, Result};

// === Configuration ===
pub use config::PipelineConfig;
pub use context::PipelineContext;

// === Artifacts ===
pub use artifacts::{ARTIFACT_PREFIX, ArtifactRecord, ArtifactStore, artifact_file_name};

// === Pipelines ===
pub use inspect::{check_fields, inspect_fit, inspect_preview};
pub use preview::{MAX_PREVIEW_ROWS, PipelinePreviewer, PreviewStep, PreviewValue};
pub use replay::{PipelineReplayer, ReplayOutcome, TargetTransformer};
pub use runner::{FitOutcome, PipelineRunner};

// === Profiling and Jobs ===
pub use job::{JobRecordUpdate, run_fit_job};
pub use profile::{
    CategoryInfo, ColumnKind, ColumnStatistics, CompactData, DatasetProfile, DatasetProfiler,
    GraphType, NumericInfo,
};
