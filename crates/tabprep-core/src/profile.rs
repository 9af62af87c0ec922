//! Column-level descriptive statistics for display.
//!
//! Numeric columns get a 10-bin histogram with moments and quartiles.
//! Everything else (including all-missing columns and `{0, 1}` flags) is
//! summarised by value frequencies:
//!
//! | graph | when |
//! |-------|------|
//! | `count` | every value is distinct |
//! | `pie` | fewer than 3 distinct values |
//! | `bar` | otherwise |

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabprep_common::{any_to_string, column_names, round_to, series_to_json};

const HISTOGRAM_BINS: usize = 10;
const SAMPLE_ROWS: usize = 5;

/// Summary of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub columns: Vec<String>,
    /// Row count.
    pub amount: usize,
    /// First rows, keyed by column then row index.
    pub sample_data: BTreeMap<String, BTreeMap<usize, Value>>,
    pub statistics: Vec<ColumnStatistics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numerical,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    Histogram,
    Count,
    Pie,
    Bar,
    /// Statistics could not be computed.
    #[serde(rename = "")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub graph_type: GraphType,
    pub compact_data: CompactData,
}

/// Graph-ready payload of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompactData {
    Histogram {
        bins_means: Vec<f64>,
        frequency: Vec<usize>,
        additional_info: NumericInfo,
    },
    Frequencies {
        elements: Vec<String>,
        frequency: Vec<usize>,
        additional_info: CategoryInfo,
    },
    Empty {},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericInfo {
    pub valid: usize,
    pub nan: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    /// `min`, `25%`, `50%`, `75%`, `max`.
    pub quantiles: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<usize>,
    pub nan: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_frequence: Option<String>,
}

/// Computes [`DatasetProfile`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetProfiler;

impl DatasetProfiler {
    /// Profile a table. Columns whose statistics fail are logged and left empty.
    pub fn profile(df: &DataFrame) -> PolarsResult<DatasetProfile> {
        let mut sample_data = BTreeMap::new();
        let mut statistics = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();
            let sample = series_to_json(&series.head(Some(SAMPLE_ROWS)))?;
            sample_data.insert(name.clone(), sample.into_iter().enumerate().collect());
            statistics.push(column_statistics(name, series));
        }
        Ok(DatasetProfile {
            columns: column_names(df),
            amount: df.height(),
            sample_data,
            statistics,
        })
    }
}

fn column_statistics(name: String, series: &Series) -> ColumnStatistics {
    let kind = column_kind(series).unwrap_or(ColumnKind::Categorical);
    let computed = match kind {
        ColumnKind::Numerical => numeric_summary(series),
        ColumnKind::Categorical => category_summary(series),
    };
    let (graph_type, compact_data) = computed.unwrap_or_else(|e| {
        tracing::error!(column = %name, error = %e, "could not compute column statistics");
        (GraphType::Unavailable, CompactData::Empty {})
    });
    ColumnStatistics {
        name,
        kind,
        graph_type,
        compact_data,
    }
}

fn column_kind(series: &Series) -> PolarsResult<ColumnKind> {
    if !series.dtype().is_primitive_numeric() || series.null_count() == series.len() {
        return Ok(ColumnKind::Categorical);
    }
    let present = present_values(series)?;
    // Missing cells count as one extra distinct value.
    let missing = present.len() < series.len();
    let distinct = present.n_unique()? + usize::from(missing);
    let is_flag =
        distinct == 2 && !missing && present.min() == Some(0.0) && present.max() == Some(1.0);
    if is_flag {
        Ok(ColumnKind::Categorical)
    } else {
        Ok(ColumnKind::Numerical)
    }
}

/// Non-missing, non-NaN values as floats.
fn present_values(series: &Series) -> PolarsResult<Float64Chunked> {
    let floats = series.cast(&DataType::Float64)?;
    let floats = floats.f64()?;
    floats.filter(&floats.is_not_nan())
}

fn numeric_summary(series: &Series) -> PolarsResult<(GraphType, CompactData)> {
    let values = present_values(series)?;
    let (bins_means, frequency) = histogram(&values);

    let valid = values.len();
    let std = if valid > 1 { values.std(1) } else { None };
    let mut quantiles = BTreeMap::new();
    for (label, q) in [("min", 0.0), ("25%", 0.25), ("50%", 0.5), ("75%", 0.75), ("max", 1.0)] {
        if let Some(value) = values.quantile(q, QuantileMethod::Linear)? {
            quantiles.insert(label.to_string(), value);
        }
    }

    let info = NumericInfo {
        valid,
        nan: series.len() - valid,
        mean: values.mean(),
        std,
        quantiles,
    };
    Ok((
        GraphType::Histogram,
        CompactData::Histogram {
            bins_means,
            frequency,
            additional_info: info,
        },
    ))
}

/// Equal-width histogram over the value range; a constant column spans `±0.5`.
fn histogram(values: &Float64Chunked) -> (Vec<f64>, Vec<usize>) {
    let (Some(first), Some(last)) = (values.min(), values.max()) else {
        return (Vec::new(), Vec::new());
    };
    let (lo, hi) = if first == last {
        (first - 0.5, last + 0.5)
    } else {
        (first, last)
    };
    let width = (hi - lo) / HISTOGRAM_BINS as f64;
    let mut frequency = vec![0; HISTOGRAM_BINS];
    for value in values.into_no_null_iter() {
        let bin = (((value - lo) / width).floor() as usize).min(HISTOGRAM_BINS - 1);
        frequency[bin] += 1;
    }
    let bins_means = (0..HISTOGRAM_BINS)
        .map(|bin| round_to(lo + width * (bin as f64 + 0.5), 3))
        .collect();
    (bins_means, frequency)
}

/// Value counts, most frequent first and ties in label order.
fn ranked_counts(series: &Series) -> PolarsResult<Vec<(String, usize)>> {
    let counts = series
        .drop_nulls()
        .with_name("value".into())
        .value_counts(false, false, "count".into(), false)?;
    let labels = counts.column("value")?.as_materialized_series();
    let frequencies = counts.column("count")?.cast(&DataType::UInt64)?;
    let mut ranked = frequencies
        .u64()?
        .into_no_null_iter()
        .enumerate()
        .map(|(idx, count)| Ok((any_to_string(labels.get(idx)?), count as usize)))
        .collect::<PolarsResult<Vec<_>>>()?;
    ranked.sort_by(|(a, na), (b, nb)| nb.cmp(na).then_with(|| a.cmp(b)));
    Ok(ranked)
}

fn category_summary(series: &Series) -> PolarsResult<(GraphType, CompactData)> {
    let nan = series.null_count();
    // Missing cells count as one extra distinct value.
    let distinct = series.n_unique()?;

    if distinct == series.len() {
        let info = CategoryInfo {
            valid: None,
            nan,
            most_frequence: None,
        };
        return Ok((
            GraphType::Count,
            CompactData::Frequencies {
                elements: vec!["unique".to_string()],
                frequency: vec![series.len()],
                additional_info: info,
            },
        ));
    }

    let ranked = ranked_counts(series)?;
    let valid = series.len() - nan;
    let graph_type = if distinct < 3 { GraphType::Pie } else { GraphType::Bar };
    let most_frequence = match graph_type {
        GraphType::Bar => ranked.first().map(|(value, _)| value.clone()),
        _ => None,
    };
    let (elements, frequency) = ranked.into_iter().unzip();
    Ok((
        graph_type,
        CompactData::Frequencies {
            elements,
            frequency,
            additional_info: CategoryInfo {
                valid: Some(valid),
                nan,
                most_frequence,
            },
        },
    ))
}
