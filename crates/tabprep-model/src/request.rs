//! User-submitted transformation requests.
//!
//! Requests arrive as JSON. Field names are a single string where commas fan
//! out into independent applications of the same transform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Key holding the original dataset id of a fit request.
pub const KEY_ORIGINAL_DATA: &str = "original_data_sequence_pk";
/// Key holding the per-field requests of a fit request.
pub const KEY_REQUEST_DATA: &str = "request_data";
/// Key holding the per-field requests of a preview request.
pub const KEY_REQUEST_TEST: &str = "request_test";
/// Key holding the transform id of a field request.
pub const KEY_TRANSFORM_ID: &str = "preprocess_functions_sequence_pk";
/// Key holding the target field name(s) of a field request.
pub const KEY_FIELD_NAME: &str = "field_name";

const FIELD_REQUEST_KEYS: [&str; 2] = [KEY_TRANSFORM_ID, KEY_FIELD_NAME];

/// One unit of work: apply a transform to one or more fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRequest {
    #[serde(rename = "preprocess_functions_sequence_pk")]
    pub transform_id: u64,
    pub field_name: String,
    #[serde(
        rename = "condition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_overrides: Option<BTreeMap<String, Value>>,
}

impl FieldRequest {
    pub fn new(transform_id: u64, field_name: impl Into<String>) -> Self {
        Self {
            transform_id,
            field_name: field_name.into(),
            parameter_overrides: None,
        }
    }

    /// Add one parameter override.
    #[must_use]
    pub fn with_override(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameter_overrides
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }

    /// Fan out the field name into the individual fields, in listed order.
    ///
    /// A name without commas is used verbatim; comma-separated names are trimmed.
    pub fn field_names(&self) -> Vec<String> {
        if self.field_name.contains(',') {
            self.field_name
                .split(',')
                .map(|name| name.trim().to_string())
                .collect()
        } else {
            vec![self.field_name.clone()]
        }
    }
}

/// A committed ("fit") request against an uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    #[serde(rename = "original_data_sequence_pk")]
    pub original_data_id: u64,
    pub request_data: Vec<FieldRequest>,
}

impl FitRequest {
    /// Returns the first mandatory key missing from a raw request body.
    pub fn missing_key(raw: &Value) -> Option<&'static str> {
        for key in [KEY_ORIGINAL_DATA, KEY_REQUEST_DATA] {
            if raw.get(key).is_none() {
                return Some(key);
            }
        }
        missing_field_request_key(raw.get(KEY_REQUEST_DATA))
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        serde_json::from_value(raw).map_err(|source| ModelError::Json {
            what: "fit request",
            source,
        })
    }
}

/// A dry-run ("test") request previewing transforms without committing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub request_test: Vec<FieldRequest>,
}

impl PreviewRequest {
    /// Returns the first mandatory key missing from a raw request body.
    pub fn missing_key(raw: &Value) -> Option<&'static str> {
        if raw.get(KEY_REQUEST_TEST).is_none() {
            return Some(KEY_REQUEST_TEST);
        }
        missing_field_request_key(raw.get(KEY_REQUEST_TEST))
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        serde_json::from_value(raw).map_err(|source| ModelError::Json {
            what: "preview request",
            source,
        })
    }
}

fn missing_field_request_key(requests: Option<&Value>) -> Option<&'static str> {
    let requests = requests?.as_array()?;
    requests.iter().find_map(|request| {
        FIELD_REQUEST_KEYS
            .into_iter()
            .find(|key| request.get(key).is_none())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_field_is_verbatim() {
        let request = FieldRequest::new(11, "temp");
        assert_eq!(request.field_names(), vec!["temp"]);
    }

    #[test]
    fn test_comma_list_fans_out_in_order() {
        let request = FieldRequest::new(13, "a, b ,c");
        assert_eq!(request.field_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_overrides_round_trip_as_condition() {
        let request = FieldRequest::new(2, "temp").with_override("n_bins", json!("3"));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "preprocess_functions_sequence_pk": 2,
                "field_name": "temp",
                "condition": {"n_bins": "3"}
            })
        );
    }

    #[test]
    fn test_fit_request_missing_keys() {
        assert_eq!(
            FitRequest::missing_key(&json!({"request_data": []})),
            Some(KEY_ORIGINAL_DATA)
        );
        assert_eq!(
            FitRequest::missing_key(&json!({
                "original_data_sequence_pk": 1,
                "request_data": [{"preprocess_functions_sequence_pk": 1}]
            })),
            Some(KEY_FIELD_NAME)
        );
        assert_eq!(
            FitRequest::missing_key(&json!({
                "original_data_sequence_pk": 1,
                "request_data": [{"preprocess_functions_sequence_pk": 1, "field_name": "a"}]
            })),
            None
        );
    }

    #[test]
    fn test_preview_request_missing_keys() {
        assert_eq!(
            PreviewRequest::missing_key(&json!({})),
            Some(KEY_REQUEST_TEST)
        );
        assert_eq!(
            PreviewRequest::missing_key(&json!({"request_test": [{"field_name": "a"}]})),
            Some(KEY_TRANSFORM_ID)
        );
    }
}
