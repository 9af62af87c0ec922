//! Class vocabularies recorded for encoding steps.
//!
//! When an encoder (label, ordinal, one-hot, binning) is fitted, the pipeline
//! records which original values map to which encoded values so the step can
//! be explained to users and reversed later.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single category observed by an encoder.
///
/// Numeric categories sort before text categories; numbers use IEEE total
/// ordering so the ordering is total even in the presence of NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassValue {
    Number(f64),
    Text(String),
}

impl ClassValue {
    /// Returns the numeric value, if this is a numeric class.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text value, if this is a text class.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

impl PartialEq for ClassValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClassValue {}

impl PartialOrd for ClassValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for ClassValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ClassValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ClassValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The encoded form of one class.
///
/// Scalar encoders (label, ordinal, binarizer) produce one number per class;
/// expanding encoders (one-hot, label binarizer, binning) produce a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedClass {
    Scalar(f64),
    Row(Vec<f64>),
}

/// Original classes paired with their encoded form.
///
/// Both lists are either recorded together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassVocabulary {
    pub original: Vec<ClassValue>,
    pub encoded: Vec<EncodedClass>,
}

impl ClassVocabulary {
    pub fn new(original: Vec<ClassValue>, encoded: Vec<EncodedClass>) -> Self {
        Self { original, encoded }
    }

    /// Number of original classes.
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}
