//! Request-shape checks that run before any transform.

use polars::prelude::DataFrame;
use serde_json::Value;
use tabprep_model::{FieldRequest, FitRequest, PreviewRequest, TransformCatalog};

use crate::error::{PipelineError, Result};

/// Parse a raw fit request and check its transform ids.
pub fn inspect_fit(raw: &Value, catalog: &TransformCatalog) -> Result<FitRequest> {
    if let Some(key) = FitRequest::missing_key(raw) {
        return Err(missing(key));
    }
    let request = FitRequest::from_value(raw.clone()).map_err(PipelineError::InvalidRequest)?;
    check_transform_ids(&request.request_data, catalog)?;
    Ok(request)
}

/// Parse a raw preview request and check its transform ids.
pub fn inspect_preview(raw: &Value, catalog: &TransformCatalog) -> Result<PreviewRequest> {
    if let Some(key) = PreviewRequest::missing_key(raw) {
        return Err(missing(key));
    }
    let request = PreviewRequest::from_value(raw.clone()).map_err(PipelineError::InvalidRequest)?;
    check_transform_ids(&request.request_test, catalog)?;
    Ok(request)
}

/// Every fanned-out field must be a column of `table`.
///
/// Requests are checked against the uploaded table as a whole, so a field
/// dropped by an earlier step still passes here and fails when it is reached.
pub fn check_fields(requests: &[FieldRequest], table: &DataFrame) -> Result<()> {
    for request in requests {
        for field in request.field_names() {
            if table.get_column_index(&field).is_none() {
                tracing::error!(
                    field = %field,
                    transform_id = request.transform_id,
                    "requested field does not exist"
                );
                return Err(PipelineError::FieldNotFound { field });
            }
        }
    }
    Ok(())
}

fn check_transform_ids(requests: &[FieldRequest], catalog: &TransformCatalog) -> Result<()> {
    match requests.iter().find(|request| !catalog.contains(request.transform_id)) {
        Some(request) => {
            tracing::error!(transform_id = request.transform_id, "unknown transform id");
            Err(PipelineError::UnknownTransformId {
                transform_id: request.transform_id,
            })
        }
        None => Ok(()),
    }
}

fn missing(key: &str) -> PipelineError {
    tracing::error!(key, "request is missing a mandatory key");
    PipelineError::MissingKey {
        key: key.to_string(),
    }
}
