//! Scaling transformers and the binarizer.
//!
//! All of them take a numeric column and return a single column. NaN cells
//! are ignored during fit and passed through unchanged, except for
//! [`Binarizer`], which rejects them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabprep_model::{ClassValue, ClassVocabulary, EncodedClass};

use super::param_map;
use super::stats::{
    finite_values, handle_zero_scale, mean, percentile, population_std, single_column, sorted,
};
use crate::column::{ColumnData, TransformOutput};
use crate::error::{Result, TransformError};
use crate::params::ParamValue;
use crate::transformer::{Transformer, decode_state, encode_state, reject_param};

fn fit_input<'a>(input: &'a ColumnData, name: &'static str) -> Result<&'a ndarray::Array1<f64>> {
    let values = input.numeric_values(name)?;
    if values.is_empty() {
        return Err(TransformError::EmptyInput { transformer: name });
    }
    Ok(values)
}

// === StandardScaler ===

/// Standardize to zero mean and unit variance: `(x - mean) / std`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
    fitted: Option<AffineFit>,
}

/// `x' = (x - center) / scale`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct AffineFit {
    center: f64,
    scale: f64,
}

impl AffineFit {
    fn apply(self, values: &ndarray::Array1<f64>) -> TransformOutput {
        TransformOutput::column(values.mapv(|x| (x - self.center) / self.scale))
    }

    fn invert(self, output: &TransformOutput, name: &'static str) -> Result<ColumnData> {
        let values = single_column(output, name)?;
        Ok(ColumnData::Numeric(
            values.mapv(|x| x * self.scale + self.center),
        ))
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
            fitted: None,
        }
    }
}

impl StandardScaler {
    pub const NAME: &'static str = "StandardScaler";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn fitted(&self) -> Result<AffineFit> {
        self.fitted.ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for StandardScaler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("with_mean", ParamValue::Bool(self.with_mean)),
            ("with_std", ParamValue::Bool(self.with_std)),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("with_mean", ParamValue::Bool(flag)) => self.with_mean = *flag,
            ("with_std", ParamValue::Bool(flag)) => self.with_std = *flag,
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        let values = fit_input(input, Self::NAME)?;
        let finite = finite_values(values);
        let center = if self.with_mean {
            mean(&finite).unwrap_or(0.0)
        } else {
            0.0
        };
        let scale = if self.with_std {
            handle_zero_scale(population_std(&finite).unwrap_or(1.0))
        } else {
            1.0
        };
        self.fitted = Some(AffineFit { center, scale });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted()?;
        Ok(fit.apply(input.numeric_values(Self::NAME)?))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        self.fitted()?.invert(output, Self::NAME)
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === RobustScaler ===

/// Scale by the median and interquartile range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustScaler {
    with_centering: bool,
    with_scaling: bool,
    quantile_range: (f64, f64),
    fitted: Option<AffineFit>,
}

impl Default for RobustScaler {
    fn default() -> Self {
        Self {
            with_centering: true,
            with_scaling: true,
            quantile_range: (25.0, 75.0),
            fitted: None,
        }
    }
}

impl RobustScaler {
    pub const NAME: &'static str = "RobustScaler";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn fitted(&self) -> Result<AffineFit> {
        self.fitted.ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for RobustScaler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        let (low, high) = self.quantile_range;
        param_map([
            ("with_centering", ParamValue::Bool(self.with_centering)),
            ("with_scaling", ParamValue::Bool(self.with_scaling)),
            (
                "quantile_range",
                ParamValue::Tuple(vec![ParamValue::Float(low), ParamValue::Float(high)]),
            ),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("with_centering", ParamValue::Bool(flag)) => self.with_centering = *flag,
            ("with_scaling", ParamValue::Bool(flag)) => self.with_scaling = *flag,
            ("quantile_range", range) => {
                self.quantile_range = range
                    .as_float_pair()
                    .ok_or_else(|| reject_param(name, &value))?;
            }
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        let (low, high) = self.quantile_range;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "quantile_range".to_string(),
                reason: format!("expected 0 <= low < high <= 100, got ({low}, {high})"),
            });
        }
        let values = fit_input(input, Self::NAME)?;
        let finite = sorted(&finite_values(values));
        let (center, scale) = if finite.is_empty() {
            (0.0, 1.0)
        } else {
            let center = if self.with_centering {
                percentile(&finite, 50.0)
            } else {
                0.0
            };
            let scale = if self.with_scaling {
                handle_zero_scale(percentile(&finite, high) - percentile(&finite, low))
            } else {
                1.0
            };
            (center, scale)
        };
        self.fitted = Some(AffineFit { center, scale });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted()?;
        Ok(fit.apply(input.numeric_values(Self::NAME)?))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        self.fitted()?.invert(output, Self::NAME)
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === MinMaxScaler ===

/// Scale into `feature_range` using the observed minimum and maximum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    clip: bool,
    fitted: Option<MinMaxFit>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MinMaxFit {
    data_min: f64,
    data_max: f64,
    scale: f64,
    min: f64,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            feature_range: (0.0, 1.0),
            clip: false,
            fitted: None,
        }
    }
}

impl MinMaxScaler {
    pub const NAME: &'static str = "MinMaxScaler";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn fitted(&self) -> Result<MinMaxFit> {
        self.fitted.ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for MinMaxScaler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        let (low, high) = self.feature_range;
        param_map([
            (
                "feature_range",
                ParamValue::Tuple(vec![ParamValue::Float(low), ParamValue::Float(high)]),
            ),
            ("clip", ParamValue::Bool(self.clip)),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("feature_range", range) => {
                self.feature_range = range
                    .as_float_pair()
                    .ok_or_else(|| reject_param(name, &value))?;
            }
            ("clip", ParamValue::Bool(flag)) => self.clip = *flag,
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        let (low, high) = self.feature_range;
        if low >= high {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "feature_range".to_string(),
                reason: format!("minimum must be smaller than maximum, got ({low}, {high})"),
            });
        }
        let values = fit_input(input, Self::NAME)?;
        let finite = finite_values(values);
        let data_min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (data_min, data_max) = if finite.is_empty() {
            (0.0, 0.0)
        } else {
            (data_min, data_max)
        };
        let scale = (high - low) / handle_zero_scale(data_max - data_min);
        self.fitted = Some(MinMaxFit {
            data_min,
            data_max,
            scale,
            min: low - data_min * scale,
        });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted()?;
        let (low, high) = self.feature_range;
        let clip = self.clip;
        let values = input.numeric_values(Self::NAME)?;
        Ok(TransformOutput::column(values.mapv(|x| {
            let scaled = x * fit.scale + fit.min;
            if clip { scaled.clamp(low, high) } else { scaled }
        })))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let fit = self.fitted()?;
        let values = single_column(output, Self::NAME)?;
        Ok(ColumnData::Numeric(values.mapv(|x| (x - fit.min) / fit.scale)))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === MaxAbsScaler ===

/// Scale by the maximum absolute value into `[-1, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaxAbsScaler {
    fitted: Option<AffineFit>,
}

impl MaxAbsScaler {
    pub const NAME: &'static str = "MaxAbsScaler";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn fitted(&self) -> Result<AffineFit> {
        self.fitted.ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }
}

impl Transformer for MaxAbsScaler {
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
        let values = fit_input(input, Self::NAME)?;
        let max_abs = finite_values(values)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        self.fitted = Some(AffineFit {
            center: 0.0,
            scale: handle_zero_scale(max_abs),
        });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted()?;
        Ok(fit.apply(input.numeric_values(Self::NAME)?))
    }

    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        self.fitted()?.invert(output, Self::NAME)
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === Normalizer ===

/// Scale each row to unit norm.
///
/// With a single input column every non-zero value becomes `±1`, which is why
/// the pipeline skips this transform when it lands on one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalizer {
    norm: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            norm: "l2".to_string(),
        }
    }
}

impl Normalizer {
    pub const NAME: &'static str = "Normalizer";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }
}

impl Transformer for Normalizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([("norm", ParamValue::Str(self.norm.clone()))])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value.as_str()) {
            ("norm", Some(norm @ ("l1" | "l2" | "max"))) => self.norm = norm.to_string(),
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        fit_input(input, Self::NAME)?;
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let values = input.numeric_values(Self::NAME)?;
        if values.iter().any(|v| v.is_nan()) {
            return Err(TransformError::MissingValues {
                transformer: Self::NAME,
            });
        }
        // Every norm of a one-element row is |x|.
        Ok(TransformOutput::column(values.mapv(|x| {
            if x == 0.0 { 0.0 } else { x / x.abs() }
        })))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

// === Binarizer ===

/// Map values above `threshold` to 1 and the rest to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Binarizer {
    threshold: f64,
}

impl Binarizer {
    pub const NAME: &'static str = "Binarizer";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn binarize(&self, x: f64) -> f64 {
        if x > self.threshold { 1.0 } else { 0.0 }
    }
}

impl Transformer for Binarizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([("threshold", ParamValue::Float(self.threshold))])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value.as_float()) {
            ("threshold", Some(threshold)) if !threshold.is_nan() => self.threshold = threshold,
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        fit_input(input, Self::NAME)?;
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let values = input.numeric_values(Self::NAME)?;
        if values.iter().any(|v| v.is_nan()) {
            return Err(TransformError::MissingValues {
                transformer: Self::NAME,
            });
        }
        Ok(TransformOutput::column(values.mapv(|x| self.binarize(x))))
    }

    fn class_vocabulary(&self, input: &ColumnData) -> Option<ClassVocabulary> {
        let ColumnData::Numeric(values) = input else {
            return None;
        };
        let unique = {
            let mut unique = sorted(&finite_values(values));
            unique.dedup();
            unique
        };
        let encoded = unique
            .iter()
            .map(|&x| EncodedClass::Row(vec![self.binarize(x)]))
            .collect();
        let original = unique.into_iter().map(ClassValue::Number).collect();
        Some(ClassVocabulary::new(original, encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}
