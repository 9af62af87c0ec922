//! End-to-end fit, preview and replay runs against temporary directories.

use std::path::{Path, PathBuf};

use ndarray::array;
use polars::prelude::*;
use serde_json::json;
use tabprep_common::column_names;
use tabprep_core::{
    ArtifactStore, FitOutcome, MAX_PREVIEW_ROWS, PipelineContext, PipelinePreviewer,
    PipelineReplayer, PipelineRunner, PreviewValue, Result,
};
use tabprep_ingest::read_index_json;
use tabprep_model::{ErrorCode, FieldRequest, FitRequest, PreviewRequest};
use tabprep_transform::{ColumnData, default_catalog, default_registry};
use tempfile::TempDir;

const LABEL_ENCODER: u64 = 4;
const ONE_HOT: u64 = 8;
const STANDARD_SCALER: u64 = 11;
const KBINS: u64 = 2;
const DROP: u64 = 13;

fn table() -> DataFrame {
    df!(
        "temp" => &[10.0, 12.0, 14.0, 16.0, 18.0, 20.0],
        "season" => &["spring", "summer", "fall", "winter", "spring", "summer"],
        "a" => &[1i64, 2, 3, 4, 5, 6],
        "b" => &["x", "y", "x", "y", "x", "y"],
    )
    .unwrap()
}

fn dirs() -> (TempDir, ArtifactStore, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = ArtifactStore::new(dir.path().join("preprocess_transformer"));
    let output = dir.path().join("preprocessed_data");
    (dir, artifacts, output)
}

fn fit(
    job_id: u64,
    requests: Vec<FieldRequest>,
    artifacts: &ArtifactStore,
    output: &Path,
) -> Result<FitOutcome> {
    let catalog = default_catalog();
    let runner = PipelineRunner::new(
        PipelineContext::new(default_registry(), &catalog),
        artifacts.clone(),
        output,
    );
    let request = FitRequest {
        original_data_id: 1,
        request_data: requests,
    };
    runner.run(job_id, &request, table())
}

fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

#[test]
fn standard_scaler_overwrites_in_place() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(1, vec![FieldRequest::new(STANDARD_SCALER, "temp")], &artifacts, &output)
        .unwrap();

    assert_eq!(column_names(&outcome.table), vec!["temp", "season", "a", "b"]);
    let mean: f64 = floats(&outcome.table, "temp").iter().sum::<f64>() / 6.0;
    assert!(mean.abs() < 1e-9);

    let steps = outcome.summary.steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].artifact_file_name.as_deref(), Some("T_1_1.json"));
    assert!(steps[0].original_classes().is_none());
    assert!(steps[0].encoded_classes().is_none());

    assert_eq!(outcome.file_name, "P_1.json");
    let stored = read_index_json(&outcome.file_path).unwrap();
    assert_eq!(column_names(&stored), column_names(&outcome.table));
}

#[test]
fn one_hot_expands_and_records_classes() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(2, vec![FieldRequest::new(ONE_HOT, "season")], &artifacts, &output)
        .unwrap();

    assert_eq!(
        column_names(&outcome.table),
        vec!["temp", "a", "b", "season_0", "season_1", "season_2", "season_3"]
    );
    let step = &outcome.summary.steps()[0];
    assert_eq!(step.original_classes().map(<[_]>::len), Some(4));
    assert_eq!(step.encoded_classes().map(<[_]>::len), Some(4));
}

#[test]
fn drop_fans_out_without_artifacts() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(
        3,
        vec![
            FieldRequest::new(DROP, "a,b"),
            FieldRequest::new(LABEL_ENCODER, "season"),
        ],
        &artifacts,
        &output,
    )
    .unwrap();

    let steps = outcome.summary.steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].field_name, "a");
    assert_eq!(steps[1].field_name, "b");
    assert!(steps[..2].iter().all(|s| s.artifact_file_name.is_none()));
    assert_eq!(column_names(&outcome.table), vec!["temp", "season"]);

    // One artifact per transform step.
    assert_eq!(artifacts.list().unwrap(), outcome.summary.artifact_names());
}

#[test]
fn failed_job_leaves_no_artifacts_or_output() {
    let (_dir, artifacts, output) = dirs();
    let err = fit(
        4,
        vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(STANDARD_SCALER, "season"),
        ],
        &artifacts,
        &output,
    )
    .unwrap_err();

    assert_eq!(err.code(), ErrorCode::TransformError);
    assert!(artifacts.list().unwrap().is_empty());
    assert!(!output.join("P_4.json").exists());
}

#[test]
fn unknown_field_fails_before_any_step() {
    let (_dir, artifacts, output) = dirs();
    let err = fit(
        5,
        vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(DROP, "humidity"),
        ],
        &artifacts,
        &output,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FieldNotFound);
    assert!(artifacts.list().unwrap().is_empty());
}

#[test]
fn replay_reproduces_fitted_table() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(
        6,
        vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(ONE_HOT, "season"),
            FieldRequest::new(DROP, "b"),
        ],
        &artifacts,
        &output,
    )
    .unwrap();

    let replayer = PipelineReplayer::new(default_registry(), &artifacts);
    let replayed = replayer.replay(table(), &outcome.summary, None).unwrap();
    assert!(replayed.table.equals_missing(&outcome.table));
    assert!(replayed.target.is_none());
}

#[test]
fn rejected_request_keeps_earlier_artifacts_of_the_job() {
    let (_dir, artifacts, output) = dirs();
    fit(10, vec![FieldRequest::new(STANDARD_SCALER, "temp")], &artifacts, &output).unwrap();
    assert_eq!(artifacts.list().unwrap(), vec!["T_10_1.json"]);

    let err = fit(
        10,
        vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(DROP, "humidity"),
        ],
        &artifacts,
        &output,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FieldNotFound);
    assert_eq!(artifacts.list().unwrap(), vec!["T_10_1.json"]);
    assert!(output.join("P_10.json").is_file());
}

/// Column-by-column comparison that tolerates integer/float widening.
fn assert_same_values(actual: &DataFrame, expected: &DataFrame) {
    assert_eq!(column_names(actual), column_names(expected));
    for name in column_names(expected) {
        let left = actual.column(&name).unwrap().as_materialized_series();
        let right = expected.column(&name).unwrap().as_materialized_series();
        if right.dtype().is_primitive_numeric() {
            let left = left.cast(&DataType::Float64).unwrap();
            let right = right.cast(&DataType::Float64).unwrap();
            let pairs = left.f64().unwrap().into_iter().zip(right.f64().unwrap());
            for (l, r) in pairs {
                assert!((l.unwrap() - r.unwrap()).abs() < 1e-9, "column {name}");
            }
        } else {
            assert!(left.equals_missing(right), "column {name}");
        }
    }
}

#[test]
fn replay_matches_stored_dataset_for_fan_out_and_labels() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(
        11,
        vec![
            FieldRequest::new(STANDARD_SCALER, "temp,a"),
            FieldRequest::new(LABEL_ENCODER, "b"),
        ],
        &artifacts,
        &output,
    )
    .unwrap();
    assert_eq!(outcome.summary.len(), 3);

    let replayer = PipelineReplayer::new(default_registry(), &artifacts);
    let replayed = replayer.replay(table(), &outcome.summary, None).unwrap();
    assert!(replayed.table.equals_missing(&outcome.table));

    let stored = read_index_json(&outcome.file_path).unwrap();
    assert_same_values(&replayed.table, &stored);
    let codes = replayed.table.column("b").unwrap().cast(&DataType::Float64).unwrap();
    let codes: Vec<f64> = codes.f64().unwrap().into_no_null_iter().collect();
    assert_eq!(codes, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn replay_fails_closed_on_missing_field() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(7, vec![FieldRequest::new(STANDARD_SCALER, "temp")], &artifacts, &output)
        .unwrap();

    let mut new_data = table();
    new_data.drop_in_place("temp").unwrap();
    let replayer = PipelineReplayer::new(default_registry(), &artifacts);
    let err = replayer.replay(new_data, &outcome.summary, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaMismatch);
}

#[test]
fn replay_returns_target_transformer_for_inverse() {
    let (_dir, artifacts, output) = dirs();
    let outcome = fit(8, vec![FieldRequest::new(LABEL_ENCODER, "b")], &artifacts, &output)
        .unwrap();

    let replayer = PipelineReplayer::new(default_registry(), &artifacts);
    let replayed = replayer.replay(table(), &outcome.summary, Some("b")).unwrap();
    let target = replayed.target.unwrap();
    assert_eq!(target.function_name(), "LabelEncoder");

    let labels = target.inverse_predictions(&array![1.0, 0.0]).unwrap();
    assert_eq!(labels, ColumnData::categorical(&[Some("y"), Some("x")]));
}

#[test]
fn preview_is_repeatable_and_writes_nothing() {
    let (_dir, artifacts, output) = dirs();
    fit(9, vec![FieldRequest::new(STANDARD_SCALER, "temp")], &artifacts, &output).unwrap();
    let before = artifacts.list().unwrap();

    let catalog = default_catalog();
    let previewer = PipelinePreviewer::new(PipelineContext::new(default_registry(), &catalog), 5);
    let request = PreviewRequest {
        request_test: vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(LABEL_ENCODER, "season"),
            FieldRequest::new(DROP, "a"),
        ],
    };
    let first = previewer.preview(&request, &table()).unwrap();
    let second = previewer.preview(&request, &table()).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(artifacts.list().unwrap(), before);

    assert_eq!(first.len(), 3);
    assert_eq!(first[0].test_result.len(), 5);
    assert!(matches!(first[0].test_result[&0], PreviewValue::Number(_)));
    assert_eq!(first[1].test_result[&0], PreviewValue::Text("1".to_string()));
    assert_eq!(first[2].test_result[&4], PreviewValue::Text(" ".to_string()));
    assert!(first[2].function_parameter.is_none());
}

#[test]
fn preview_reports_parameter_syntax() {
    let catalog = default_catalog();
    let previewer = PipelinePreviewer::new(PipelineContext::new(default_registry(), &catalog), 5);
    let raw = json!({"request_test": [
        {"preprocess_functions_sequence_pk": STANDARD_SCALER, "field_name": "temp"},
        {
            "preprocess_functions_sequence_pk": KBINS,
            "field_name": "temp",
            "condition": {"n_bins": "abc{"}
        }
    ]});
    let err = previewer.preview_raw(&raw, &table()).unwrap_err();
    assert_eq!(err.payload().error_type, ErrorCode::ParameterSyntax);
}

#[test]
fn preview_sees_progressive_drops() {
    let catalog = default_catalog();
    let previewer = PipelinePreviewer::new(PipelineContext::new(default_registry(), &catalog), 5);
    let request = PreviewRequest {
        request_test: vec![
            FieldRequest::new(DROP, "temp"),
            FieldRequest::new(STANDARD_SCALER, "temp"),
        ],
    };
    let err = previewer.preview(&request, &table()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FieldNotFound);
}

#[test]
fn preview_rejects_unknown_field_before_any_transform() {
    let catalog = default_catalog();
    let previewer = PipelinePreviewer::new(PipelineContext::new(default_registry(), &catalog), 5);
    let raw = json!({"request_test": [
        {
            "preprocess_functions_sequence_pk": KBINS,
            "field_name": "temp",
            "condition": {"n_bins": "abc{"}
        },
        {"preprocess_functions_sequence_pk": DROP, "field_name": "humidity"}
    ]});
    let err = previewer.preview_raw(&raw, &table()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FieldNotFound);
}

#[test]
fn preview_row_count_is_capped() {
    let catalog = default_catalog();
    let previewer = PipelinePreviewer::new(PipelineContext::new(default_registry(), &catalog), 8);
    assert_eq!(previewer.preview_rows(), MAX_PREVIEW_ROWS);

    let request = PreviewRequest {
        request_test: vec![
            FieldRequest::new(STANDARD_SCALER, "temp"),
            FieldRequest::new(DROP, "a"),
        ],
    };
    let steps = previewer.preview(&request, &table()).unwrap();
    assert_eq!(steps[0].test_result.len(), MAX_PREVIEW_ROWS);
    assert_eq!(steps[1].test_result.len(), MAX_PREVIEW_ROWS);
}
