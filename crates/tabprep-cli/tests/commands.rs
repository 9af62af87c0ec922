//! Subcommands run against a temporary result directory.

use std::fs;
use std::path::Path;

use serde_json::json;
use tabprep_cli::commands::{
    ReplayInput, Workspace, run_fit, run_preview, run_profile, run_replay, write_record,
};
use tabprep_core::{GraphType, PipelineError};
use tabprep_model::ErrorCode;
use tempfile::TempDir;

fn workspace() -> (TempDir, Workspace) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().display().to_string().replace('\\', "/");
    let config_path = dir.path().join("tabprep.toml");
    fs::write(
        &config_path,
        format!(
            "original_data_dir = \"{root}/original_data\"\n\
             output_dir = \"{root}/preprocessed_data\"\n\
             artifact_dir = \"{root}/preprocess_transformer\"\n\
             preview_rows = 3\n"
        ),
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("original_data")).unwrap();
    fs::write(
        dir.path().join("original_data/O_1.csv"),
        "temp,season\n10.0,spring\n12.0,summer\n14.0,fall\n16.0,spring\n",
    )
    .unwrap();
    let workspace = Workspace::load(Some(&config_path)).unwrap();
    (dir, workspace)
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, value.to_string()).unwrap();
    path
}

#[test]
fn config_file_sets_directories() {
    let (dir, workspace) = workspace();
    assert_eq!(workspace.config.preview_rows, 3);
    assert!(workspace.config.artifact_dir.starts_with(dir.path()));
    assert!(!workspace.catalog.is_empty());
}

#[test]
fn fit_then_replay_with_target_inverse() {
    let (dir, workspace) = workspace();
    let request = write_json(
        dir.path(),
        "fit.json",
        &json!({
            "original_data_sequence_pk": 1,
            "request_data": [
                {"preprocess_functions_sequence_pk": 11, "field_name": "temp"},
                {"preprocess_functions_sequence_pk": 4, "field_name": "season"}
            ]
        }),
    );

    let update = run_fit(&workspace, 3, &request).unwrap();
    assert!(update.is_success());
    let record = dir.path().join("record.json");
    write_record(&update, &record).unwrap();

    let predictions = write_json(dir.path(), "pred.json", &json!([0.0, 1.0]));
    let output = dir.path().join("replayed.json");
    let report = run_replay(
        &workspace,
        ReplayInput {
            summary: &record,
            table: &dir.path().join("original_data/O_1.csv"),
            output: Some(&output),
            target: Some("season"),
            predictions: Some(&predictions),
        },
    )
    .unwrap();

    assert_eq!(report.steps, 2);
    assert_eq!(report.table.height(), 4);
    assert!(output.is_file());
    let (function, values) = report.inverse.unwrap();
    assert_eq!(function, "LabelEncoder");
    assert_eq!(values, vec![json!("fall"), json!("spring")]);
}

#[test]
fn preview_uses_configured_row_cap() {
    let (dir, workspace) = workspace();
    let request = write_json(
        dir.path(),
        "test.json",
        &json!({"request_test": [
            {"preprocess_functions_sequence_pk": 11, "field_name": "temp"}
        ]}),
    );

    let steps = run_preview(&workspace, 1, &request, None).unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].test_result.len(), 3);

    let steps = run_preview(&workspace, 1, &request, Some(2)).unwrap();
    assert_eq!(steps[0].test_result.len(), 2);
}

#[test]
fn preview_error_keeps_pipeline_code() {
    let (dir, workspace) = workspace();
    let request = write_json(
        dir.path(),
        "test.json",
        &json!({"request_test": [
            {"preprocess_functions_sequence_pk": 11, "field_name": "humidity"}
        ]}),
    );

    let err = run_preview(&workspace, 1, &request, None).unwrap_err();
    let pipeline = err.downcast_ref::<PipelineError>().unwrap();
    assert_eq!(pipeline.code(), ErrorCode::FieldNotFound);
}

#[test]
fn profile_reads_uploaded_table() {
    let (dir, _workspace) = workspace();
    let profile = run_profile(&dir.path().join("original_data/O_1.csv")).unwrap();
    assert_eq!(profile.amount, 4);
    assert_eq!(profile.columns, vec!["temp", "season"]);
    assert_eq!(profile.statistics[0].graph_type, GraphType::Histogram);
    assert_eq!(profile.statistics[1].graph_type, GraphType::Bar);
}
