//! K-bins discretization of continuous columns.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tabprep_model::{ClassValue, ClassVocabulary, EncodedClass};

use super::param_map;
use super::stats::{mean, percentile, single_column, sorted};
use crate::column::{ColumnData, SparseMatrix, TransformOutput};
use crate::error::{Result, TransformError};
use crate::params::ParamValue;
use crate::transformer::{Transformer, decode_state, encode_state, reject_param};

const KMEANS_MAX_ITER: usize = 300;

/// Edges closer than this are merged in quantile binning.
const EDGE_TOLERANCE: f64 = 1e-8;

/// Bin continuous values into intervals.
///
/// `encode` selects the output: `onehot` (sparse, the default), `onehot-dense`
/// or `ordinal` (one column of bin indices). `strategy` selects the edges:
/// `uniform` widths, `quantile` populations (the default) or 1-D `kmeans`
/// cluster boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KBinsDiscretizer {
    n_bins: i64,
    encode: String,
    strategy: String,
    edges: Option<Vec<f64>>,
}

impl Default for KBinsDiscretizer {
    fn default() -> Self {
        Self {
            n_bins: 5,
            encode: "onehot".to_string(),
            strategy: "quantile".to_string(),
            edges: None,
        }
    }
}

impl KBinsDiscretizer {
    pub const NAME: &'static str = "KBinsDiscretizer";

    pub fn restore(state: serde_json::Value) -> Result<Box<dyn Transformer>> {
        Ok(Box::new(decode_state::<Self>(Self::NAME, state)?))
    }

    fn edges(&self) -> Result<&[f64]> {
        self.edges.as_deref().ok_or(TransformError::NotFitted {
            transformer: Self::NAME,
        })
    }

    fn bin_edges(&self, sorted_values: &[f64]) -> Vec<f64> {
        let n_bins = self.n_bins as usize;
        let min = sorted_values[0];
        let max = sorted_values[sorted_values.len() - 1];
        if min == max {
            return vec![min, max];
        }
        match self.strategy.as_str() {
            "uniform" => linspace(min, max, n_bins + 1),
            "kmeans" => kmeans_edges(sorted_values, n_bins),
            _ => {
                let quantiles = linspace(0.0, 100.0, n_bins + 1)
                    .into_iter()
                    .map(|q| percentile(sorted_values, q))
                    .collect::<Vec<_>>();
                let mut edges: Vec<f64> = Vec::with_capacity(quantiles.len());
                for edge in quantiles {
                    if edges.last().is_none_or(|&last| edge - last > EDGE_TOLERANCE) {
                        edges.push(edge);
                    }
                }
                edges
            }
        }
    }

    fn encode_bins(&self, bins: &[usize], n_bins: usize) -> TransformOutput {
        match self.encode.as_str() {
            "ordinal" => {
                TransformOutput::column(bins.iter().map(|&bin| bin as f64).collect::<Array1<f64>>())
            }
            "onehot-dense" => {
                let mut dense = Array2::zeros((bins.len(), n_bins));
                for (row, &bin) in bins.iter().enumerate() {
                    dense[[row, bin]] = 1.0;
                }
                TransformOutput::Matrix(dense)
            }
            _ => {
                let rows: Vec<Vec<(usize, f64)>> = bins.iter().map(|&bin| vec![(bin, 1.0)]).collect();
                TransformOutput::Sparse(SparseMatrix::from_rows(n_bins, &rows))
            }
        }
    }
}

/// `count` evenly spaced values from `start` to `stop` inclusive.
fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let step = (stop - start) / (count - 1) as f64;
    (0..count)
        .map(|idx| {
            if idx == count - 1 {
                stop
            } else {
                start + step * idx as f64
            }
        })
        .collect()
}

/// Bin of `value`: the number of inner edges not greater than it.
fn bin_of(edges: &[f64], value: f64) -> usize {
    let inner = &edges[1..edges.len() - 1];
    inner.partition_point(|&edge| edge <= value)
}

/// Edges from 1-D k-means: midpoints between sorted cluster centers.
fn kmeans_edges(sorted_values: &[f64], n_bins: usize) -> Vec<f64> {
    let min = sorted_values[0];
    let max = sorted_values[sorted_values.len() - 1];
    let uniform = linspace(min, max, n_bins + 1);
    let mut centers: Vec<f64> = uniform.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

    for _ in 0..KMEANS_MAX_ITER {
        let mut clusters: Vec<Vec<f64>> = vec![Vec::new(); centers.len()];
        for &value in sorted_values {
            let nearest = centers
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (value - **a).abs().total_cmp(&(value - **b).abs()))
                .map_or(0, |(idx, _)| idx);
            clusters[nearest].push(value);
        }
        let updated: Vec<f64> = clusters
            .iter()
            .zip(&centers)
            .map(|(members, &center)| mean(members).unwrap_or(center))
            .collect();
        let converged = updated
            .iter()
            .zip(&centers)
            .all(|(new, old)| (new - old).abs() <= EDGE_TOLERANCE);
        centers = updated;
        if converged {
            break;
        }
    }

    centers = sorted(&centers);
    let mut edges = Vec::with_capacity(centers.len() + 1);
    edges.push(min);
    edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    edges.push(max);
    edges
}

impl Transformer for KBinsDiscretizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn params(&self) -> BTreeMap<String, ParamValue> {
        param_map([
            ("n_bins", ParamValue::Int(self.n_bins)),
            ("encode", ParamValue::Str(self.encode.clone())),
            ("strategy", ParamValue::Str(self.strategy.clone())),
        ])
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, &value) {
            ("n_bins", ParamValue::Int(n_bins)) => self.n_bins = *n_bins,
            ("encode", ParamValue::Str(encode))
                if matches!(encode.as_str(), "onehot" | "onehot-dense" | "ordinal") =>
            {
                self.encode.clone_from(encode);
            }
            ("strategy", ParamValue::Str(strategy))
                if matches!(strategy.as_str(), "uniform" | "quantile" | "kmeans") =>
            {
                self.strategy.clone_from(strategy);
            }
            _ => return Err(reject_param(name, &value)),
        }
        Ok(())
    }

    fn fit_transform(&mut self, input: &ColumnData) -> Result<TransformOutput> {
        if self.n_bins < 2 {
            return Err(TransformError::InvalidParameter {
                transformer: Self::NAME,
                name: "n_bins".to_string(),
                reason: format!("at least 2 bins are required, got {}", self.n_bins),
            });
        }
        let values = input.numeric_values(Self::NAME)?;
        if values.is_empty() {
            return Err(TransformError::EmptyInput {
                transformer: Self::NAME,
            });
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(TransformError::MissingValues {
                transformer: Self::NAME,
            });
        }
        let sorted_values = sorted(&values.to_vec());
        self.edges = Some(self.bin_edges(&sorted_values));
        self.transform(input)
    }

    fn transform(&self, input: &ColumnData) -> Result<TransformOutput> {
        let edges = self.edges()?;
        let values = input.numeric_values(Self::NAME)?;
        if values.iter().any(|v| v.is_nan()) {
            return Err(TransformError::MissingValues {
                transformer: Self::NAME,
            });
        }
        let bins: Vec<usize> = values.iter().map(|&value| bin_of(edges, value)).collect();
        Ok(self.encode_bins(&bins, edges.len() - 1))
    }

    /// Maps each bin back to its center.
    fn inverse_transform(&self, output: &TransformOutput) -> Result<ColumnData> {
        let edges = self.edges()?;
        let n_bins = edges.len() - 1;
        let bins: Vec<usize> = if self.encode == "ordinal" {
            single_column(output, Self::NAME)?
                .iter()
                .map(|&code| (code.max(0.0) as usize).min(n_bins - 1))
                .collect()
        } else {
            let dense = output.to_dense();
            if dense.ncols() != n_bins {
                return Err(TransformError::WidthMismatch {
                    transformer: Self::NAME,
                    expected: n_bins,
                    got: dense.ncols(),
                });
            }
            dense
                .rows()
                .into_iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .max_by(|(_, a), (_, b)| a.total_cmp(b))
                        .map_or(0, |(idx, _)| idx)
                })
                .collect()
        };
        Ok(ColumnData::Numeric(
            bins.iter()
                .map(|&bin| (edges[bin] + edges[bin + 1]) / 2.0)
                .collect(),
        ))
    }

    /// Bin edges paired with the encoding of each edge value.
    fn class_vocabulary(&self, _input: &ColumnData) -> Option<ClassVocabulary> {
        let edges = self.edges.as_deref()?;
        let n_bins = edges.len() - 1;
        let encoded = edges
            .iter()
            .map(|&edge| {
                let bin = bin_of(edges, edge);
                if self.encode == "ordinal" {
                    EncodedClass::Row(vec![bin as f64])
                } else {
                    let mut row = vec![0.0; n_bins];
                    row[bin] = 1.0;
                    EncodedClass::Row(row)
                }
            })
            .collect();
        let original = edges.iter().copied().map(ClassValue::Number).collect();
        Some(ClassVocabulary::new(original, encoded))
    }

    fn state(&self) -> Result<serde_json::Value> {
        encode_state(Self::NAME, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ages() -> ColumnData {
        ColumnData::numeric(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
    }

    fn discretizer(params: &[(&str, ParamValue)]) -> KBinsDiscretizer {
        let mut discretizer = KBinsDiscretizer::default();
        for (name, value) in params {
            discretizer.set_param(name, value.clone()).unwrap();
        }
        discretizer
    }

    #[test]
    fn test_default_output_is_sparse_one_hot() {
        let mut discretizer = KBinsDiscretizer::default();
        let output = discretizer.fit_transform(&ages()).unwrap();
        assert!(matches!(output, TransformOutput::Sparse(_)));
        assert_eq!(output.width(), Some(5));
        assert_eq!(output.rows(), 10);
    }

    #[test]
    fn test_uniform_ordinal_bins() {
        let mut discretizer = discretizer(&[
            ("n_bins", ParamValue::Int(3)),
            ("encode", ParamValue::Str("ordinal".into())),
            ("strategy", ParamValue::Str("uniform".into())),
        ]);
        let output = discretizer
            .fit_transform(&ColumnData::numeric(vec![0.0, 2.0, 4.0, 6.0]))
            .unwrap();
        assert_eq!(output.to_dense().column(0).to_vec(), vec![0.0, 1.0, 2.0, 2.0]);

        let centers = discretizer.inverse_transform(&output).unwrap();
        assert_eq!(centers, ColumnData::numeric(vec![1.0, 3.0, 5.0, 5.0]));
    }

    #[test]
    fn test_quantile_edges_merge_duplicates() {
        let mut discretizer = discretizer(&[("encode", ParamValue::Str("ordinal".into()))]);
        discretizer
            .fit_transform(&ColumnData::numeric(
                [vec![1.0; 9], vec![2.0]].concat(),
            ))
            .unwrap();
        let vocabulary = discretizer
            .class_vocabulary(&ColumnData::numeric(vec![]))
            .unwrap();
        assert_eq!(
            vocabulary.original,
            vec![ClassValue::Number(1.0), ClassValue::Number(2.0)]
        );
    }

    #[test]
    fn test_kmeans_separates_clusters() {
        let mut discretizer = discretizer(&[
            ("n_bins", ParamValue::Int(2)),
            ("encode", ParamValue::Str("ordinal".into())),
            ("strategy", ParamValue::Str("kmeans".into())),
        ]);
        let output = discretizer
            .fit_transform(&ColumnData::numeric(vec![0.0, 1.0, 10.0, 11.0]))
            .unwrap();
        assert_eq!(output.to_dense().column(0).to_vec(), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_vocabulary_pairs_edges_with_rows() {
        let mut discretizer = discretizer(&[
            ("n_bins", ParamValue::Int(2)),
            ("strategy", ParamValue::Str("uniform".into())),
        ]);
        discretizer
            .fit_transform(&ColumnData::numeric(vec![0.0, 10.0]))
            .unwrap();
        let vocabulary = discretizer
            .class_vocabulary(&ColumnData::numeric(vec![]))
            .unwrap();
        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.encoded[0], EncodedClass::Row(vec![1.0, 0.0]));
        assert_eq!(vocabulary.encoded[1], EncodedClass::Row(vec![0.0, 1.0]));
        assert_eq!(vocabulary.encoded[2], EncodedClass::Row(vec![0.0, 1.0]));
    }

    #[test]
    fn test_too_few_bins_is_invalid() {
        let mut discretizer = discretizer(&[("n_bins", ParamValue::Int(1))]);
        assert!(matches!(
            discretizer.fit_transform(&ages()),
            Err(TransformError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_text_input_is_rejected() {
        let mut discretizer = KBinsDiscretizer::default();
        assert!(matches!(
            discretizer.fit_transform(&ColumnData::categorical(&[Some("a")])),
            Err(TransformError::NonNumeric { .. })
        ));
    }
}
