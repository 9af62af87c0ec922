//! Fit jobs driven from raw request bodies and on-disk datasets.

use std::fs;

use serde_json::json;
use tabprep_core::{JobRecordUpdate, PipelineConfig, PipelineContext, run_fit_job};
use tabprep_model::ErrorCode;
use tabprep_transform::{default_catalog, default_registry};
use tempfile::TempDir;

fn config_with_dataset() -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        original_data_dir: dir.path().join("original_data"),
        output_dir: dir.path().join("preprocessed_data"),
        artifact_dir: dir.path().join("preprocess_transformer"),
        ..PipelineConfig::default()
    };
    fs::create_dir_all(&config.original_data_dir).unwrap();
    fs::write(
        config.original_data_dir.join("O_1.csv"),
        "temp,season,id\n10.5,spring,1\n12.0,summer,2\n9.5,fall,3\n11.0,spring,4\n",
    )
    .unwrap();
    (dir, config)
}

#[test]
fn successful_job_reports_summary_and_profile() {
    let (_dir, config) = config_with_dataset();
    let catalog = default_catalog();
    let raw = json!({
        "original_data_sequence_pk": 1,
        "request_data": [
            {"preprocess_functions_sequence_pk": 11, "field_name": "temp"},
            {"preprocess_functions_sequence_pk": 4, "field_name": "season"},
            {"preprocess_functions_sequence_pk": 13, "field_name": "id"}
        ]
    });

    let update = run_fit_job(PipelineContext::new(default_registry(), &catalog), &config, 21, &raw);
    assert!(update.is_success());

    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["state"], "success");
    assert_eq!(json["file_name"], "P_21.json");
    assert_eq!(json["amount"], 4);
    assert_eq!(json["columns"], json!(["temp", "season"]));
    assert_eq!(json["summary"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["summary"][1]["artifact_file_name"], "T_21_2.json");
    assert_eq!(json["summary"][2]["artifact_file_name"], serde_json::Value::Null);
    assert!(config.output_dir.join("P_21.json").is_file());
}

#[test]
fn missing_dataset_marks_job_failed() {
    let (_dir, config) = config_with_dataset();
    let catalog = default_catalog();
    let raw = json!({
        "original_data_sequence_pk": 2,
        "request_data": [{"preprocess_functions_sequence_pk": 11, "field_name": "temp"}]
    });

    let update = run_fit_job(PipelineContext::new(default_registry(), &catalog), &config, 22, &raw);
    let JobRecordUpdate::Fail { error, .. } = update else {
        panic!("expected a failed job");
    };
    assert_eq!(error.error_type, ErrorCode::DataNotFound);
}

#[test]
fn missing_key_marks_job_failed() {
    let (_dir, config) = config_with_dataset();
    let catalog = default_catalog();
    let raw = json!({"original_data_sequence_pk": 1});

    let update = run_fit_job(PipelineContext::new(default_registry(), &catalog), &config, 23, &raw);
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["state"], "fail");
    assert_eq!(json["error"]["error_type"], "missing-key");
}
