//! `tabprep` command-line tool.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tabprep_cli::commands::{
    ReplayInput, Workspace, run_fit, run_preview, run_profile, run_replay, write_record,
};
use tabprep_cli::logging::{LogConfig, LogFormat, init_logging};
use tabprep_cli::summary::{
    catalog_table, preview_table, profile_table, steps_table, values_line,
};
use tabprep_core::{JobRecordUpdate, PipelineError};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, FitArgs, LogFormatArg, LogLevelArg, ReplayArgs};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            report_error(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let workspace = Workspace::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Fit(args) => fit(&workspace, args, cli.json),
        Command::Preview(args) => {
            let steps = run_preview(&workspace, args.dataset_id, &args.request, args.rows)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                println!("{}", preview_table(&steps));
            }
            Ok(0)
        }
        Command::Replay(args) => replay(&workspace, args, cli.json),
        Command::Profile(args) => {
            let profile = run_profile(&args.table)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Rows: {}", profile.amount);
                println!("{}", profile_table(&profile));
            }
            Ok(0)
        }
        Command::Transforms => {
            println!("{}", catalog_table(&workspace.catalog));
            Ok(0)
        }
    }
}

fn fit(workspace: &Workspace, args: &FitArgs, json: bool) -> anyhow::Result<i32> {
    let update = run_fit(workspace, args.job_id, &args.request)?;
    if let Some(path) = &args.record {
        write_record(&update, path)?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&update)?);
        return Ok(if update.is_success() { 0 } else { 1 });
    }
    match &update {
        JobRecordUpdate::Success {
            file_path,
            summary,
            profile,
            ..
        } => {
            println!("Output: {}", file_path.display());
            println!("Rows: {}  Columns: {}", profile.amount, profile.columns.len());
            println!("{}", steps_table(summary));
            Ok(0)
        }
        JobRecordUpdate::Fail { error, .. } => {
            eprintln!("error[{}]: {}", error.error_type, error.error_msg);
            Ok(1)
        }
    }
}

fn replay(workspace: &Workspace, args: &ReplayArgs, json: bool) -> anyhow::Result<i32> {
    let report = run_replay(
        workspace,
        ReplayInput {
            summary: &args.summary,
            table: &args.table,
            output: args.output.as_deref(),
            target: args.target.as_deref(),
            predictions: args.predictions.as_deref(),
        },
    )?;
    if json {
        let inverse = report.inverse.as_ref().map(|(function, values)| {
            serde_json::json!({"function_name": function, "values": values})
        });
        let body = serde_json::json!({
            "steps": report.steps,
            "rows": report.table.height(),
            "columns": report.table.get_column_names_str(),
            "output": report.output.as_deref().map(|path| path.display().to_string()),
            "inverse": inverse,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(0);
    }
    println!(
        "Replayed {} steps: {} rows x {} columns",
        report.steps,
        report.table.height(),
        report.table.width()
    );
    if let Some(path) = &report.output {
        println!("Output: {}", path.display());
    }
    if let Some((function, values)) = &report.inverse {
        println!("{function} inverse: {}", values_line(values));
    }
    Ok(0)
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

/// Pipeline errors carry a stable code; print it alongside the message.
fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<PipelineError>() {
        Some(pipeline) => eprintln!("error[{}]: {error:#}", pipeline.code()),
        None => eprintln!("error: {error:#}"),
    }
}
