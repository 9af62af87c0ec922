//! Categorical encoders.
//!
//! Encoders accept numeric or text columns and reject missing cells. Each of
//! them records a class vocabulary after fit.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tabprep_model::{ClassValue, ClassVocabulary, EncodedClass};

use super::param_map;
use super::stats::{present_labels, single_column, unique_labels};
use crate::column::{ColumnData, SparseMatrix, TransformOutput};
use crate::error::{Result, TransformError};
use crate::params::ParamValue;
use crate::transformer::{Transformer, decode_state, encode_state, reject_param};

fn ensure_rows(input: &ColumnData, transformer: &'static str) -> Result<()> {
    if input.is_empty() {
        return Err(TransformError::EmptyInput { transformer });
    }
    Ok(())
}

fn class_index(classes: &[ClassValue]) -> BTreeMap<&ClassValue, usize> {
    classes
        .iter()
        .enumerate()
        .map(|(idx, class)| (class, idx))
        .collect()
}

/// `categories` parameter: `"auto"` or an explicit list.
fn categories_param(name: &str, value: &ParamValue) -> Result<Option<Vec<String>>> {
    match value {
        ParamValue::Str(text) if text == "auto" => Ok(None),
        ParamValue::List(items) => Ok(Some(items.clone())),
        _ => Err(reject_param(name, value)),
    }
}

fn categories_value(categories: Option<&Vec<String>>) -> ParamValue {
    categories.map_or_else(
        || ParamValue::Str("auto".to_string()),
        |items| ParamValue::List(items.clone()),
    )
}

/// Explicit categories take the type of the input column; `auto` learns them.
fn resolve_categories(
    explicit: Option<&[String]>,
    input: &ColumnData,
    transformer: &'static str,
) -> Result<Vec<ClassValue>> {
    let Some(items) = explicit else {
        return unique_labels(input, transformer);
    };
    if items.is_empty() {
        return Err(TransformError::InvalidParameter {
            transformer,
            name: "categories".to_string(),
            reason: "at least one category is required".to_string(),
        });
    }
    items
        .iter()
        .map(|item| {
            if input.is_numeric() {
                item.trim()
                    .parse::<f64>()
                    .map(ClassValue::Number)
                    .map_err(|_| TransformError::InvalidParameter {
                        transformer,
                        name: "categories".to_string(),
                        reason: format!("'{item}' is not a number"),
                    })
            } else {
                Ok(ClassValue::Text(item.clone()))
            }
        })
        .collect()
}

/// Column of decoded labels; numeric when every present label is numeric.
fn column_from_labels(labels: Vec<Option<ClassValue>>) -> ColumnData {
    if labels.iter().flatten().all(|label| label.as_f64().is_some()) {
        ColumnData::Numeric(
            labels
                .iter()
                .map(|label| label.as_ref().and_then(ClassValue::as_f64).unwrap_or(f64::NAN))
                .collect(),
        )
    } else {
        ColumnData::Categorical(
            labels
                .into_iter()
                .map(|label| label.map(|label| label.to_string()))
                .collect(),
        )
    }
}

/// Class at an integer code.
fn decode_code(classes: &[ClassValue], code: f64, transformer: &'static str) -> Result<ClassValue> {
    let valid = code.fract() == 0.0 && code >= 0.0 && (code as usize) < classes.len();
    if !valid {
        return Err(TransformError::UnseenLabel {
            transformer,
            label: code.to_string(),
        });
    }
    Ok(classes[code as usize].clone())
}

/// Column of the largest value in a row, with that value.
fn argmax(row: ArrayView1<'_, f64>) -> Option<(usize, f64)> {
    row.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, value)| match best {
            Some((_, top)) if top >= value => best,
            _ => Some((idx, value)),
        })
}

fn expect_width(dense: &Array2<f64>, expected: usize, transformer: &'static str) -> Result<()> {
    if dense.ncols() != expected {
        return Err(TransformError::WidthMismatch {
            transformer,
            expected,
            got: dense.ncols(),
        });
    }
    Ok(())
}

// === LabelEncoder ===

/// Encode labels as `0..n_classes`, returning one code per row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Option<Vec<ClassValue>>,
}

impl LabelEncoder {
    pub const NAME: &'static str = "LabelEncoder";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn classes(&self) -> Result<&[ClassValue]> {
        self.classes.as_deref().ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for LabelEncoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        BTreeMap::new()
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        Err(reject_param(name, &value))
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        ensure_rows(input, Self::NAME)?;
        self.classes = Some(unique_labels(input, Self::NAME)?);
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let index = class_index(self.classes()?);
        let codes = present_labels(input, Self::NAME)?
            .iter()
            .map(|label| {
                index
                    .get(label)
                    .map(|&code| code as f64)
                    .ok_or_else(|| TransformError::UnseenLabel {
                        transformer: Self::NAME,
                        label: label.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TransformOutput::Vector(Array1::from(codes)))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let classes = self.classes()?;
        let labels = single_column(output, Self::NAME)?
            .iter()
            .map(|&code| decode_code(classes, code, Self::NAME))
            .collect::<Result<Vec<_>>>()?;
        Ok(ColumnData::from_labels(&labels))
    }

    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        let classes = self.classes.as_ref()?;
        let encoded = (0..classes.len())
            .map(|code| EncodedClass::Scalar(code as f64))
            .collect();
        Some(ClassVocabulary::new(classes.clone(), encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === OrdinalEncoder ===

/// Encode categories as ordinal codes in a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    categories: Option<Vec<String>>,
    handle_unknown: String,
    unknown_value: Option<f64>,
    fitted: Option<Vec<ClassValue>>,
}

impl Default for OrdinalEncoder {
    fn default() -> Self {
        Self {
            categories: None,
            handle_unknown: "error".to_string(),
            unknown_value: None,
            fitted: None,
        }
    }
}

impl OrdinalEncoder {
    pub const NAME: &'static str = "OrdinalEncoder";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn categories(&self) -> Result<&[ClassValue]> {
        self.fitted.as_deref().ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }

    fn encodes_unknown(&self) -> bool {
        self.handle_unknown == "use_encoded_value"
    }
}

impl Transformer for OrdinalEncoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("categories", categories_value(self.categories.as_ref())),
            ("handle_unknown", ParamValue::Str(self.handle_unknown.clone())),
            (
                "unknown_value",
                self.unknown_value.map_or(ParamValue::Null, ParamValue::Float),
            ),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("categories", _) => self.categories = categories_param(name, &value)?,
            ("handle_unknown", ParamValue::Str(mode))
                if matches!(mode.as_str(), "error" | "use_encoded_value") =>
            {
                self.handle_unknown.clone_from(mode);
            }
            ("unknown_value", ParamValue::Null) => self.unknown_value = None,
            ("unknown_value", number) if number.as_float().is_some() => {
                self.unknown_value = number.as_float();
            }
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        if self.encodes_unknown() && self.unknown_value.is_none() {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "unknown_value".to_string(),
                reason: "required when handle_unknown is 'use_encoded_value'".to_string(),
            });
        }
        ensure_rows(input, Self::NAME)?;
        self.fitted = Some(resolve_categories(
            self.categories.as_deref(),
            input,
            Self::NAME,
        )?);
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let index = class_index(self.categories()?);
        let codes = present_labels(input, Self::NAME)?
            .iter()
            .map(|label| match (index.get(label), self.unknown_value) {
                (Some(&code), _) => Ok(code as f64),
                (None, Some(unknown)) if self.encodes_unknown() => Ok(unknown),
                (None, _) => Err(TransformError::UnseenLabel {
                    transformer: Self::NAME,
                    label: label.to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TransformOutput::column(Array1::from(codes)))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let categories = self.categories()?;
        let labels = single_column(output, Self::NAME)?
            .iter()
            .map(|&code| {
                let unknown = code.is_nan()
                    || self
                        .unknown_value
                        .is_some_and(|value| value == code && self.encodes_unknown());
                if unknown {
                    Ok(None)
                } else {
                    decode_code(categories, code, Self::NAME).map(Some)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(column_from_labels(labels))
    }

    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        let categories = self.fitted.as_ref()?;
        let encoded = (0..categories.len())
            .map(|code| EncodedClass::Row(vec![code as f64]))
            .collect();
        Some(ClassVocabulary::new(categories.clone(), encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === OneHotEncoder ===

/// Encode each category as its own indicator column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Option<Vec<String>>,
    sparse_output: bool,
    handle_unknown: String,
    drop: Option<String>,
    fitted: Option<OneHotFit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OneHotFit {
    categories: Vec<ClassValue>,
    /// Category encoded as an all-zero row.
    dropped: Option<usize>,
}

impl OneHotFit {
    fn width(&self) -> usize {
        self.categories.len() - usize::from(self.dropped.is_some())
    }

    /// Output column of a category, `None` for the dropped one.
    fn position(&self, category: usize) -> Option<usize> {
        match self.dropped {
            Some(dropped) if dropped == category => None,
            Some(dropped) if category > dropped => Some(category - 1),
            _ => Some(category),
        }
    }

    fn category_at(&self, position: usize) -> usize {
        match self.dropped {
            Some(dropped) if position >= dropped => position + 1,
            _ => position,
        }
    }

    fn dense_row(&self, category: usize) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];
        if let Some(position) = self.position(category) {
            row[position] = 1.0;
        }
        row
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self {
            categories: None,
            sparse_output: true,
            handle_unknown: "error".to_string(),
            drop: None,
            fitted: None,
        }
    }
}

impl OneHotEncoder {
    pub const NAME: &'static str = "OneHotEncoder";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn fitted(&self) -> Result<&OneHotFit> {
        self.fitted.as_ref().ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for OneHotEncoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("categories", categories_value(self.categories.as_ref())),
            ("sparse_output", ParamValue::Bool(self.sparse_output)),
            ("handle_unknown", ParamValue::Str(self.handle_unknown.clone())),
            (
                "drop",
                self.drop.clone().map_or(ParamValue::Null, ParamValue::Str),
            ),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("categories", _) => self.categories = categories_param(name, &value)?,
            ("sparse_output" | "sparse", ParamValue::Bool(flag)) => self.sparse_output = *flag,
            ("handle_unknown", ParamValue::Str(mode)) if matches!(mode.as_str(), "error" | "ignore") => {
                self.handle_unknown.clone_from(mode);
            }
            ("drop", ParamValue::Null) => self.drop = None,
            ("drop", ParamValue::Str(mode)) if matches!(mode.as_str(), "first" | "if_binary") => {
                self.drop = Some(mode.clone());
            }
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        ensure_rows(input, Self::NAME)?;
        let categories = resolve_categories(self.categories.as_deref(), input, Self::NAME)?;
        let dropped = match self.drop.as_deref() {
            Some("first") => Some(0),
            Some("if_binary") if categories.len() == 2 => Some(0),
            _ => None,
        };
        self.fitted = Some(OneHotFit {
            categories,
            dropped,
        });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted()?;
        let index = class_index(&fit.categories);
        let ignore_unknown = self.handle_unknown == "ignore";
        let rows = present_labels(input, Self::NAME)?
            .iter()
            .map(|label| match index.get(label) {
                Some(&category) => Ok(fit
                    .position(category)
                    .map(|position| vec![(position, 1.0)])
                    .unwrap_or_default()),
                None if ignore_unknown => Ok(Vec::new()),
                None => Err(TransformError::UnseenLabel {
                    transformer: Self::NAME,
                    label: label.to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let matrix = SparseMatrix::from_rows(fit.width(), &rows);
        if self.sparse_output {
            Ok(TransformOutput::Sparse(matrix))
        } else {
            Ok(TransformOutput::Matrix(matrix.to_dense()))
        }
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let fit = self.fitted()?;
        let dense = output.to_dense();
        expect_width(&dense, fit.width(), Self::NAME)?;
        let labels = dense
            .rows()
            .into_iter()
            .map(|row| match argmax(row) {
                Some((position, value)) if value > 0.0 => {
                    Some(fit.categories[fit.category_at(position)].clone())
                }
                _ => fit.dropped.map(|dropped| fit.categories[dropped].clone()),
            })
            .collect();
        Ok(column_from_labels(labels))
    }

    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        let fit = self.fitted.as_ref()?;
        let encoded = (0..fit.categories.len())
            .map(|category| EncodedClass::Row(fit.dense_row(category)))
            .collect();
        Some(ClassVocabulary::new(fit.categories.clone(), encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === LabelBinarizer ===

/// One-vs-all label binarization.
///
/// Two classes produce a single column; more classes produce one column each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelBinarizer {
    neg_label: i64,
    pos_label: i64,
    sparse_output: bool,
    classes: Option<Vec<ClassValue>>,
}

impl Default for LabelBinarizer {
    fn default() -> Self {
        Self {
            neg_label: 0,
            pos_label: 1,
            sparse_output: false,
            classes: None,
        }
    }
}

impl LabelBinarizer {
    pub const NAME: &'static str = "LabelBinarizer";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn classes(&self) -> Result<&[ClassValue]> {
        self.classes.as_deref().ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }

    fn width(classes: &[ClassValue]) -> usize {
        if classes.len() <= 2 { 1 } else { classes.len() }
    }

    /// Column set to `pos_label` for a class, `None` for the negative class.
    fn positive_column(classes: &[ClassValue], class: usize) -> Option<usize> {
        if classes.len() <= 2 {
            (class == 1).then_some(0)
        } else {
            Some(class)
        }
    }

    fn dense_row(&self, classes: &[ClassValue], class: Option<usize>) -> Vec<f64> {
        let mut row = vec![self.neg_label as f64; Self::width(classes)];
        if let Some(column) = class.and_then(|class| Self::positive_column(classes, class)) {
            row[column] = self.pos_label as f64;
        }
        row
    }
}

impl Transformer for LabelBinarizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("neg_label", ParamValue::Int(self.neg_label)),
            ("pos_label", ParamValue::Int(self.pos_label)),
            ("sparse_output", ParamValue::Bool(self.sparse_output)),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("neg_label", ParamValue::Int(label)) => self.neg_label = *label,
            ("pos_label", ParamValue::Int(label)) => self.pos_label = *label,
            ("sparse_output", ParamValue::Bool(flag)) => self.sparse_output = *flag,
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        if self.neg_label >= self.pos_label {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "neg_label".to_string(),
                reason: format!(
                    "neg_label={} must be strictly less than pos_label={}",
                    self.neg_label, self.pos_label
                ),
            });
        }
        if self.sparse_output && (self.pos_label == 0 || self.neg_label != 0) {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "sparse_output".to_string(),
                reason: "sparse output requires neg_label=0 and a non-zero pos_label".to_string(),
            });
        }
        ensure_rows(input, Self::NAME)?;
        self.classes = Some(unique_labels(input, Self::NAME)?);
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let classes = self.classes()?;
        let index = class_index(classes);
        let labels = present_labels(input, Self::NAME)?;
        let width = Self::width(classes);
        if self.sparse_output {
            let rows: Vec<Vec<(usize, f64)>> = labels
                .iter()
                .map(|label| {
                    index
                        .get(label)
                        .and_then(|&class| Self::positive_column(classes, class))
                        .map(|column| vec![(column, self.pos_label as f64)])
                        .unwrap_or_default()
                })
                .collect();
            return Ok(TransformOutput::Sparse(SparseMatrix::from_rows(width, &rows)));
        }
        let mut dense = Array2::from_elem((labels.len(), width), self.neg_label as f64);
        for (row, label) in labels.iter().enumerate() {
            if let Some(column) = index
                .get(label)
                .and_then(|&class| Self::positive_column(classes, class))
            {
                dense[[row, column]] = self.pos_label as f64;
            }
        }
        Ok(TransformOutput::Matrix(dense))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let classes = self.classes()?;
        let dense = output.to_dense();
        expect_width(&dense, Self::width(classes), Self::NAME)?;
        let labels: Vec<ClassValue> = if classes.len() <= 2 {
            let threshold = (self.neg_label + self.pos_label) as f64 / 2.0;
            let positive = classes.len() - 1;
            dense
                .column(0)
                .iter()
                .map(|&value| classes[if value > threshold { positive } else { 0 }].clone())
                .collect()
        } else {
            dense
                .rows()
                .into_iter()
                .map(|row| classes[argmax(row).map_or(0, |(idx, _)| idx)].clone())
                .collect()
        };
        Ok(ColumnData::from_labels(&labels))
    }

    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        let classes = self.classes.as_ref()?;
        let encoded = (0..classes.len())
            .map(|class| EncodedClass::Row(self.dense_row(classes, Some(class))))
            .collect();
        Some(ClassVocabulary::new(classes.clone(), encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn seasons() -> ColumnData {
        ColumnData::categorical(&[Some("winter"), Some("spring"), Some("summer"), Some("fall")])
    }

    #[test]
    fn test_label_encoder_codes_sorted_classes() {
        let mut encoder = LabelEncoder::default();
        let output = encoder.fit_transform(&seasons()).unwrap();
        assert_eq!(output, TransformOutput::Vector(array![3.0, 1.0, 2.0, 0.0]));

        let vocabulary = encoder.class_vocabulary(&seasons()).unwrap();
        assert_eq!(
            vocabulary.original,
            vec![
                ClassValue::from("fall"),
                ClassValue::from("spring"),
                ClassValue::from("summer"),
                ClassValue::from("winter"),
            ]
        );
        assert_eq!(vocabulary.encoded[3], EncodedClass::Scalar(3.0));
    }

    #[test]
    fn test_label_encoder_inverts_and_rejects_unseen() {
        let mut encoder = LabelEncoder::default();
        encoder.fit_transform(&seasons()).unwrap();
        let restored = encoder
            .inverse_transform(&TransformOutput::Vector(array![0.0, 3.0]))
            .unwrap();
        assert_eq!(restored, ColumnData::categorical(&[Some("fall"), Some("winter")]));

        let err = encoder
            .transform(&ColumnData::categorical(&[Some("monsoon")]))
            .unwrap_err();
        assert!(matches!(err, TransformError::UnseenLabel { ref label, .. } if label == "monsoon"));
    }

    #[test]
    fn test_label_encoder_rejects_missing() {
        let mut encoder = LabelEncoder::default();
        let err = encoder
            .fit_transform(&ColumnData::categorical(&[Some("a"), None]))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingValues { .. }));
    }

    #[test]
    fn test_ordinal_encoder_returns_one_column() {
        let mut encoder = OrdinalEncoder::default();
        let output = encoder
            .fit_transform(&ColumnData::numeric(vec![10.0, 30.0, 20.0]))
            .unwrap();
        assert_eq!(output, TransformOutput::Matrix(array![[0.0], [2.0], [1.0]]));
        let vocabulary = encoder
            .class_vocabulary(&ColumnData::numeric(vec![]))
            .unwrap();
        assert_eq!(vocabulary.encoded[1], EncodedClass::Row(vec![1.0]));
    }

    #[test]
    fn test_ordinal_encoder_encodes_unknown_values() {
        let mut encoder = OrdinalEncoder::default();
        encoder
            .set_param("handle_unknown", ParamValue::Str("use_encoded_value".into()))
            .unwrap();
        encoder.set_param("unknown_value", ParamValue::Int(-1)).unwrap();
        encoder
            .fit_transform(&ColumnData::categorical(&[Some("a"), Some("b")]))
            .unwrap();
        let output = encoder
            .transform(&ColumnData::categorical(&[Some("b"), Some("z")]))
            .unwrap();
        assert_eq!(output, TransformOutput::Matrix(array![[1.0], [-1.0]]));

        let restored = encoder.inverse_transform(&output).unwrap();
        assert_eq!(restored, ColumnData::categorical(&[Some("b"), None]));
    }

    #[test]
    fn test_ordinal_encoder_requires_unknown_value() {
        let mut encoder = OrdinalEncoder::default();
        encoder
            .set_param("handle_unknown", ParamValue::Str("use_encoded_value".into()))
            .unwrap();
        assert!(matches!(
            encoder.fit_transform(&seasons()),
            Err(TransformError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_one_hot_encoder_is_sparse_by_default() {
        let mut encoder = OneHotEncoder::default();
        let output = encoder.fit_transform(&seasons()).unwrap();
        let TransformOutput::Sparse(matrix) = &output else {
            panic!("expected sparse output");
        };
        assert_eq!(matrix.shape(), (4, 4));
        assert_eq!(output.to_dense().sum(), 4.0);
        assert_eq!(output.to_dense().row(0).to_vec(), vec![0.0, 0.0, 0.0, 1.0]);

        let vocabulary = encoder.class_vocabulary(&seasons()).unwrap();
        assert_eq!(vocabulary.len(), 4);
        assert_eq!(vocabulary.encoded[0], EncodedClass::Row(vec![1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_one_hot_encoder_drops_first_category() {
        let mut encoder = OneHotEncoder::default();
        encoder.set_param("sparse", ParamValue::Bool(false)).unwrap();
        encoder.set_param("drop", ParamValue::Str("first".into())).unwrap();
        let output = encoder.fit_transform(&seasons()).unwrap();
        assert_eq!(output.width(), Some(3));

        let restored = encoder.inverse_transform(&output).unwrap();
        assert_eq!(restored, seasons());
    }

    #[test]
    fn test_one_hot_encoder_rejects_empty_category_list() {
        let mut encoder = OneHotEncoder::default();
        encoder.set_param("categories", ParamValue::List(Vec::new())).unwrap();
        encoder.set_param("drop", ParamValue::Str("first".into())).unwrap();
        let err = encoder.fit_transform(&seasons()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidParameter { ref name, .. } if name == "categories"
        ));
        assert!(encoder.class_vocabulary(&seasons()).is_none());
    }

    #[test]
    fn test_one_hot_encoder_ignores_unknown() {
        let mut encoder = OneHotEncoder::default();
        encoder
            .set_param("handle_unknown", ParamValue::Str("ignore".into()))
            .unwrap();
        encoder.fit_transform(&seasons()).unwrap();
        let output = encoder
            .transform(&ColumnData::categorical(&[Some("monsoon")]))
            .unwrap();
        assert_eq!(output.to_dense().row(0).sum(), 0.0);
    }

    #[test]
    fn test_label_binarizer_two_classes_use_one_column() {
        let mut binarizer = LabelBinarizer::default();
        let input = ColumnData::categorical(&[Some("yes"), Some("no"), Some("yes")]);
        let output = binarizer.fit_transform(&input).unwrap();
        assert_eq!(output, TransformOutput::Matrix(array![[1.0], [0.0], [1.0]]));
        assert_eq!(binarizer.inverse_transform(&output).unwrap(), input);
    }

    #[test]
    fn test_label_binarizer_many_classes_use_one_column_each() {
        let mut binarizer = LabelBinarizer::default();
        let output = binarizer.fit_transform(&seasons()).unwrap();
        assert_eq!(output.width(), Some(4));
        assert_eq!(binarizer.inverse_transform(&output).unwrap(), seasons());

        let vocabulary = binarizer.class_vocabulary(&seasons()).unwrap();
        assert_eq!(vocabulary.encoded[1], EncodedClass::Row(vec![0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_label_binarizer_validates_labels() {
        let mut binarizer = LabelBinarizer::default();
        binarizer.set_param("neg_label", ParamValue::Int(2)).unwrap();
        assert!(matches!(
            binarizer.fit_transform(&seasons()),
            Err(TransformError::InvalidParameter { .. })
        ));
    }
}
