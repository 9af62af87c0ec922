//! Shared numeric helpers for the built-in transformers.

use ndarray::Array1;
use tabprep_model::ClassValue;

use crate::column::{ColumnData, TransformOutput};
use crate::error::{Result, TransformError};

/// Non-NaN values, in input order.
pub(crate) fn finite_values(values: &Array1<f64>) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (`ddof = 0`).
pub(crate) fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sorts ascending; NaN must already be removed.
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and non-empty; `q` is in `[0, 100]`.
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = (q / 100.0 * last as f64).clamp(0.0, last as f64);
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(last);
    let frac = position - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Treat zero scales as one so constant columns pass through unchanged.
pub(crate) fn handle_zero_scale(scale: f64) -> f64 {
    if scale == 0.0 || !scale.is_finite() {
        1.0
    } else {
        scale
    }
}

/// Sorted distinct labels, failing on missing cells.
pub(crate) fn unique_labels(input: &ColumnData, transformer: &'static str) -> Result<Vec<ClassValue>> {
    let mut labels = present_labels(input, transformer)?;
    labels.sort();
    labels.dedup();
    Ok(labels)
}

/// Every label in row order, failing on missing cells.
pub(crate) fn present_labels(input: &ColumnData, transformer: &'static str) -> Result<Vec<ClassValue>> {
    input
        .labels()
        .into_iter()
        .map(|label| label.ok_or(TransformError::MissingValues { transformer }))
        .collect()
}

/// Values of a single-column or rank-1 output.
pub(crate) fn single_column(output: &TransformOutput, transformer: &'static str) -> Result<Array1<f64>> {
    match output {
        TransformOutput::Vector(values) => Ok(values.clone()),
        other => {
            let dense = other.to_dense();
            if dense.ncols() != 1 {
                return Err(TransformError::WidthMismatch {
                    transformer,
                    expected: 1,
                    got: dense.ncols(),
                });
            }
            Ok(dense.column(0).to_owned())
        }
    }
}
