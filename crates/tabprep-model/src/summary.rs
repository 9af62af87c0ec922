//! The durable record of the steps applied to a dataset.
//!
//! A [`Summary`] is the ordered list of [`StepRecord`]s produced by a fit job.
//! Replay walks it front to back, so ordering is significant.

use serde::{Deserialize, Serialize};

use crate::classes::{ClassValue, ClassVocabulary, EncodedClass};
use crate::descriptor::DROP_COLUMNS;
use crate::error::{ModelError, Result};

/// One applied step.
///
/// `artifact_file_name` is `None` exactly for `DropColumns` steps.
/// `original_classes` and `encoded_classes` are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredStep")]
pub struct StepRecord {
    pub field_name: String,
    pub function_name: String,
    pub function_id: u64,
    pub artifact_file_name: Option<String>,
    original_classes: Option<Vec<ClassValue>>,
    encoded_classes: Option<Vec<EncodedClass>>,
}

/// Step as read from JSON, before the class lists are checked.
#[derive(Deserialize)]
struct StoredStep {
    field_name: String,
    function_name: String,
    function_id: u64,
    #[serde(alias = "file_name")]
    artifact_file_name: Option<String>,
    original_classes: Option<Vec<ClassValue>>,
    encoded_classes: Option<Vec<EncodedClass>>,
}

impl TryFrom<StoredStep> for StepRecord {
    type Error = ModelError;

    fn try_from(stored: StoredStep) -> Result<Self> {
        let paired = match (&stored.original_classes, &stored.encoded_classes) {
            (Some(original), Some(encoded)) => original.len() == encoded.len(),
            (None, None) => true,
            _ => false,
        };
        if !paired {
            return Err(ModelError::UnpairedClasses {
                field_name: stored.field_name,
            });
        }
        Ok(Self {
            field_name: stored.field_name,
            function_name: stored.function_name,
            function_id: stored.function_id,
            artifact_file_name: stored.artifact_file_name,
            original_classes: stored.original_classes,
            encoded_classes: stored.encoded_classes,
        })
    }
}

impl StepRecord {
    /// Record a column removal.
    pub fn dropped(field_name: impl Into<String>, function_id: u64) -> Self {
        Self {
            field_name: field_name.into(),
            function_name: DROP_COLUMNS.to_string(),
            function_id,
            artifact_file_name: None,
            original_classes: None,
            encoded_classes: None,
        }
    }

    /// Record a fitted transform with its persisted artifact.
    pub fn fitted(
        field_name: impl Into<String>,
        function_name: impl Into<String>,
        function_id: u64,
        artifact_file_name: impl Into<String>,
        vocabulary: Option<ClassVocabulary>,
    ) -> Self {
        let (original_classes, encoded_classes) = match vocabulary {
            Some(vocabulary) => (Some(vocabulary.original), Some(vocabulary.encoded)),
            None => (None, None),
        };
        Self {
            field_name: field_name.into(),
            function_name: function_name.into(),
            function_id,
            artifact_file_name: Some(artifact_file_name.into()),
            original_classes,
            encoded_classes,
        }
    }

    pub fn is_drop(&self) -> bool {
        self.function_name == DROP_COLUMNS
    }

    pub fn original_classes(&self) -> Option<&[ClassValue]> {
        self.original_classes.as_deref()
    }

    pub fn encoded_classes(&self) -> Option<&[EncodedClass]> {
        self.encoded_classes.as_deref()
    }

    /// The recorded class vocabulary, if any.
    pub fn vocabulary(&self) -> Option<ClassVocabulary> {
        match (&self.original_classes, &self.encoded_classes) {
            (Some(original), Some(encoded)) => {
                Some(ClassVocabulary::new(original.clone(), encoded.clone()))
            }
            _ => None,
        }
    }
}

/// Ordered sequence of step records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    steps: Vec<StepRecord>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Artifact file names in application order.
    pub fn artifact_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| step.artifact_file_name.as_deref())
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ModelError::Json {
            what: "summary",
            source,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| ModelError::Json {
            what: "summary",
            source,
        })
    }
}

impl From<Vec<StepRecord>> for Summary {
    fn from(steps: Vec<StepRecord>) -> Self {
        Self { steps }
    }
}

impl<'a> IntoIterator for &'a Summary {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for Summary {
    type Item = StepRecord;
    type IntoIter = std::vec::IntoIter<StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_step_has_no_artifact_or_classes() {
        let step = StepRecord::dropped("a", 13);
        assert!(step.is_drop());
        assert!(step.artifact_file_name.is_none());
        assert!(step.vocabulary().is_none());
    }

    #[test]
    fn test_fitted_step_keeps_vocabulary_pairs_together() {
        let vocabulary = ClassVocabulary::new(
            vec![ClassValue::from("fall"), ClassValue::from("spring")],
            vec![EncodedClass::Scalar(0.0), EncodedClass::Scalar(1.0)],
        );
        let step = StepRecord::fitted("season", "LabelEncoder", 4, "T_1_1.json", Some(vocabulary));
        assert_eq!(step.original_classes().map(<[_]>::len), Some(2));
        assert_eq!(step.encoded_classes().map(<[_]>::len), Some(2));

        let plain = StepRecord::fitted("temp", "StandardScaler", 11, "T_1_2.json", None);
        assert!(plain.original_classes().is_none());
        assert!(plain.encoded_classes().is_none());
    }

    #[test]
    fn test_summary_serializes_as_array() {
        let summary = Summary::from(vec![
            StepRecord::dropped("a", 13),
            StepRecord::fitted("temp", "StandardScaler", 11, "T_1_1.json", None),
        ]);
        let json = summary.to_json().unwrap();
        assert!(json.starts_with('['));
        let parsed = Summary::from_json(&json).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!(parsed.artifact_names(), vec!["T_1_1.json"]);
    }

    #[test]
    fn test_classes_without_encodings_are_rejected() {
        let json = r#"[{"field_name": "season", "function_name": "LabelEncoder",
            "function_id": 4, "artifact_file_name": "T_3_1.json",
            "original_classes": ["fall", "spring"]}]"#;
        let err = Summary::from_json(json).unwrap_err();
        assert!(matches!(err, ModelError::Json { what: "summary", .. }));
    }

    #[test]
    fn test_legacy_file_name_key_is_accepted() {
        let json = r#"[{"field_name": "temp", "function_name": "StandardScaler",
            "function_id": 11, "file_name": "T_3_1.json",
            "original_classes": null, "encoded_classes": null}]"#;
        let summary = Summary::from_json(json).unwrap();
        assert_eq!(
            summary.steps()[0].artifact_file_name.as_deref(),
            Some("T_3_1.json")
        );
    }
}
