//! Missing-value imputation.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::param_map;
use super::stats::{finite_values, mean, percentile, sorted};
use crate::column::{ColumnData, TransformOutput};
use crate::error::{Result, TransformError};
use crate::params::ParamValue;
use crate::transformer::{Transformer, decode_state, encode_state, reject_param};

/// Replace NaN cells with a statistic of the column.
///
/// A column with no observed values has no statistic. It is dropped from the
/// output (zero columns) unless `keep_empty_features` is set, in which case
/// it is filled with zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: String,
    fill_value: Option<f64>,
    keep_empty_features: bool,
    fitted: Option<ImputeFit>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ImputeFit {
    statistic: Option<f64>,
}

impl Default for SimpleImputer {
    fn default() -> Self {
        Self {
            strategy: "mean".to_string(),
            fill_value: None,
            keep_empty_features: false,
            fitted: None,
        }
    }
}

impl SimpleImputer {
    pub const NAME: &'static str = "SimpleImputer";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn statistic(&self, finite: &[f64]) -> Option<f64> {
        match self.strategy.as_str() {
            "constant" => Some(self.fill_value.unwrap_or(0.0)),
            _ if finite.is_empty() => None,
            "median" => Some(percentile(&sorted(finite), 50.0)),
            "most_frequent" => most_frequent(finite),
            _ => mean(finite),
        }
    }
}

/// Most common value; ties go to the smallest.
fn most_frequent(values: &[f64]) -> Option<f64> {
    let ordered = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    for run in ordered.chunk_by(|a, b| a == b) {
        if best.is_none_or(|(_, count)| run.len() > count) {
            best = Some((run[0], run.len()));
        }
    }
    best.map(|(value, _)| value)
}

impl Transformer for SimpleImputer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("strategy", ParamValue::Str(self.strategy.clone())),
            (
                "fill_value",
                self.fill_value.map_or(ParamValue::Null, ParamValue::Float),
            ),
            (
                "keep_empty_features",
                ParamValue::Bool(self.keep_empty_features),
            ),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("strategy", ParamValue::Str(strategy))
                if matches!(
                    strategy.as_str(),
                    "mean" | "median" | "most_frequent" | "constant"
                ) =>
            {
                self.strategy.clone_from(strategy);
            }
            ("fill_value", ParamValue::Null) => self.fill_value = None,
            ("fill_value", ParamValue::Int(_) | ParamValue::Float(_)) => {
                self.fill_value = value.as_float();
            }
            ("keep_empty_features", ParamValue::Bool(flag)) => self.keep_empty_features = *flag,
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        let values = input.numeric_values(Self::NAME)?;
        if values.is_empty() {
            return Err(TransformError::EmptyInput {
                transformer: Self::NAME,
            });
        }
        self.fitted = Some(ImputeFit {
            statistic: self.statistic(&finite_values(values)),
        });
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let fit = self.fitted.ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })?;
        let values = input.numeric_values(Self::NAME)?;
        let fill = match (fit.statistic, self.keep_empty_features) {
            (Some(statistic), _) => statistic,
            (None, true) => 0.0,
            (None, false) => return Ok(TransformOutput::Matrix(Array2::zeros((values.len(), 0)))),
        };
        Ok(TransformOutput::column(
            values.mapv(|x| if x.is_nan() { fill } else { x }),
        ))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}
