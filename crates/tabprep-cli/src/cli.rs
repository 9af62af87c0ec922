//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tabprep",
    version,
    about = "Fit, preview and replay column transforms on tabular datasets",
    long_about = "Run preprocessing pipelines over uploaded tables.\n\n\
                  A fit job transforms a dataset field by field, persists every fitted\n\
                  transformer and records a replayable summary. Previews dry-run the same\n\
                  requests on the first rows without writing anything."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Pipeline configuration file (TOML). Built-in defaults when omitted.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a fit job and persist its artifacts and transformed dataset.
    Fit(FitArgs),

    /// Dry-run a request on the first rows of a dataset.
    Preview(PreviewArgs),

    /// Apply a recorded summary to new data with the fitted artifacts.
    Replay(ReplayArgs),

    /// Describe the columns of a table.
    Profile(ProfileArgs),

    /// List the transforms in the catalog.
    Transforms,
}

#[derive(Parser)]
pub struct FitArgs {
    /// Job id; names the transformed dataset and the artifacts.
    #[arg(long = "job-id", value_name = "ID")]
    pub job_id: u64,

    /// Fit request body (JSON).
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Also write the job-record update to this file.
    #[arg(long = "record", value_name = "PATH")]
    pub record: Option<PathBuf>,
}

#[derive(Parser)]
pub struct PreviewArgs {
    /// Uploaded dataset to preview against.
    #[arg(long = "dataset-id", value_name = "ID")]
    pub dataset_id: u64,

    /// Preview request body (JSON).
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Number of rows to preview, at most 5 (default from configuration).
    #[arg(long = "rows", value_name = "N")]
    pub rows: Option<usize>,
}

#[derive(Parser)]
pub struct ReplayArgs {
    /// Summary to replay: a step list, or a job-record update carrying one.
    #[arg(value_name = "SUMMARY")]
    pub summary: PathBuf,

    /// New data to transform (CSV or JSON).
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    /// Write the replayed table here as index-oriented JSON.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Prediction target column.
    #[arg(long = "target", value_name = "FIELD")]
    pub target: Option<String>,

    /// JSON array of predicted values to map back through the target transform.
    #[arg(long = "predictions", value_name = "PATH", requires = "target")]
    pub predictions: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ProfileArgs {
    /// Table to describe (CSV, JSON lines, or a transformed `P_*.json`).
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
