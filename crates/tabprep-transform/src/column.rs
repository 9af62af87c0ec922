//! Column input and transform output containers.

use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use tabprep_common::any_to_string;
use tabprep_model::ClassValue;

use crate::error::{Result, TransformError};

/// Values of a single table column as seen by a transformer.
///
/// Numeric columns carry NaN for missing cells; categorical columns carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Array1<f64>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    /// Reads a series, coercing to `f64` when every non-null cell converts
    /// losslessly and keeping the values as text otherwise.
    pub fn from_series(series: &Series) -> Self {
        if let Ok(numeric) = series.strict_cast(&DataType::Float64)
            && let Ok(values) = numeric.f64()
        {
            return Self::Numeric(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect());
        }
        let values = (0..series.len())
            .map(|idx| match series.get(idx) {
                Ok(AnyValue::Null) | Err(_) => None,
                Ok(value) => Some(any_to_string(value)),
            })
            .collect();
        Self::Categorical(values)
    }

    pub fn numeric(values: Vec<f64>) -> Self {
        Self::Numeric(Array1::from(values))
    }

    pub fn categorical<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        Self::Categorical(
            values
                .iter()
                .map(|value| value.as_ref().map(|s| s.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// The first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        match self {
            Self::Numeric(values) => Self::Numeric(values.iter().take(n).copied().collect()),
            Self::Categorical(values) => Self::Categorical(values.iter().take(n).cloned().collect()),
        }
    }

    /// Numeric view, or [`TransformError::NonNumeric`] for text columns.
    pub fn numeric_values(&self, transformer: &'static str) -> Result<&Array1<f64>> {
        match self {
            Self::Numeric(values) => Ok(values),
            Self::Categorical(_) => Err(TransformError::NonNumeric { transformer }),
        }
    }

    /// Cells as class labels, `None` for missing.
    pub fn labels(&self) -> Vec<Option<ClassValue>> {
        match self {
            Self::Numeric(values) => values
                .iter()
                .map(|v| (!v.is_nan()).then_some(ClassValue::Number(*v)))
                .collect(),
            Self::Categorical(values) => values
                .iter()
                .map(|v| v.as_ref().map(|s| ClassValue::Text(s.clone())))
                .collect(),
        }
    }

    /// Rebuilds a column from class labels, numeric if every label is numeric.
    pub fn from_labels(labels: &[ClassValue]) -> Self {
        if labels.iter().all(|label| label.as_f64().is_some()) {
            Self::Numeric(labels.iter().filter_map(ClassValue::as_f64).collect())
        } else {
            Self::Categorical(labels.iter().map(|label| Some(label.to_string())).collect())
        }
    }

    /// Converts back to a series; NaN becomes null.
    pub fn to_series(&self, name: &str) -> Series {
        match self {
            Self::Numeric(values) => {
                let data: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| (!v.is_nan()).then_some(*v))
                    .collect();
                Series::new(name.into(), data)
            }
            Self::Categorical(values) => Series::new(name.into(), values.clone()),
        }
    }
}

/// Shape of a column or block of columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnShape {
    pub rows: usize,
    pub width: usize,
}

impl ColumnShape {
    pub fn new(rows: usize, width: usize) -> Self {
        Self { rows, width }
    }

    /// Shape of a single source column.
    pub fn of(column: &ColumnData) -> Self {
        Self::new(column.len(), 1)
    }
}

/// Compressed sparse row matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Builds a matrix from per-row `(column, value)` entries.
    pub fn from_rows(cols: usize, rows: &[Vec<(usize, f64)>]) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in rows {
            for &(col, value) in row {
                if value != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            rows: rows.len(),
            cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.rows, self.cols));
        for row in 0..self.rows {
            for pos in self.indptr[row]..self.indptr[row + 1] {
                dense[[row, self.indices[pos]]] = self.data[pos];
            }
        }
        dense
    }
}

/// Raw output of `fit_transform` / `transform`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    /// Rank-1 array, one value per row.
    Vector(Array1<f64>),
    /// Dense 2-D array.
    Matrix(Array2<f64>),
    /// Sparse 2-D array.
    Sparse(SparseMatrix),
}

impl TransformOutput {
    /// Wraps values as a single-column matrix.
    pub fn column(values: Array1<f64>) -> Self {
        Self::Matrix(values.insert_axis(Axis(1)))
    }

    pub fn rows(&self) -> usize {
        match self {
            Self::Vector(values) => values.len(),
            Self::Matrix(values) => values.nrows(),
            Self::Sparse(matrix) => matrix.rows,
        }
    }

    /// Second dimension; `None` for rank-1 output.
    pub fn width(&self) -> Option<usize> {
        match self {
            Self::Vector(_) => None,
            Self::Matrix(values) => Some(values.ncols()),
            Self::Sparse(matrix) => Some(matrix.cols),
        }
    }

    /// Densifies; rank-1 output becomes a single column.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            Self::Vector(values) => values.clone().insert_axis(Axis(1)),
            Self::Matrix(values) => values.clone(),
            Self::Sparse(matrix) => matrix.to_dense(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_numeric_strings_are_coerced() {
        let series = Series::new("temp".into(), &[Some("1.5"), None, Some("3")]);
        let column = ColumnData::from_series(&series);
        let ColumnData::Numeric(values) = column else {
            panic!("expected numeric column");
        };
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }

    #[test]
    fn test_text_falls_back_to_categorical() {
        let series = Series::new("season".into(), &[Some("spring"), None, Some("1")]);
        let column = ColumnData::from_series(&series);
        assert_eq!(
            column,
            ColumnData::categorical(&[Some("spring"), None, Some("1")])
        );
    }

    #[test]
    fn test_integers_become_floats() {
        let series = Series::new("n".into(), &[1i64, 2, 3]);
        assert_eq!(
            ColumnData::from_series(&series),
            ColumnData::numeric(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_sparse_round_trips_to_dense() {
        let sparse = SparseMatrix::from_rows(3, &[vec![(0, 1.0)], vec![(2, 1.0)], vec![]]);
        assert_eq!(
            sparse.to_dense(),
            array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]]
        );
    }
}
