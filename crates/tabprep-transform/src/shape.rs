//! Output shape classification.
//!
//! The integration strategy for a step is derived from the shape of the
//! transform output alone, never from a per-transform table. The same
//! transformer can therefore land in different categories depending on what
//! it produced (an imputer returning zero columns, a one-hot encoder on a
//! single category).

use std::fmt;

use crate::column::{ColumnShape, TransformOutput};
use crate::error::{Result, TransformError};

/// Transforms whose single-column output is left out of the table.
///
/// A row normalizer on one column maps every value to `±1` or `0`.
pub const NOOP_TRANSFORMS: &[&str] = &["Normalizer"];

/// How a transform output re-enters the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// 2-D output with one column: overwrite the source column.
    OverwriteScalar,
    /// Rank-1 output: overwrite the source column and record classes.
    EncodeScalar,
    /// 2-D output (dense or sparse) with `width != 1`: replace the source
    /// column with `<field>_0..<field>_{width-1}`.
    ExpandColumns { width: usize },
    /// Single-column output of a transform in [`NOOP_TRANSFORMS`]: leave the
    /// table untouched.
    NoOp,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverwriteScalar => f.write_str("overwrite"),
            Self::EncodeScalar => f.write_str("encode"),
            Self::ExpandColumns { width } => write!(f, "expand({width})"),
            Self::NoOp => f.write_str("no-op"),
        }
    }
}

/// Classify a transform output against the shape of its source column.
///
/// # Errors
///
/// Returns [`TransformError::RowMismatch`] when the output row count differs
/// from the source column.
pub fn classify(
    function_name: &str,
    source: ColumnShape,
    output: &TransformOutput,
) -> Result<Category> {
    if output.rows() != source.rows {
        return Err(TransformError::RowMismatch {
            expected: source.rows,
            got: output.rows(),
        });
    }
    let category = match output.width() {
        None => Category::EncodeScalar,
        Some(1) if NOOP_TRANSFORMS.contains(&function_name) => Category::NoOp,
        Some(1) => Category::OverwriteScalar,
        Some(width) => Category::ExpandColumns { width },
    };
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::SparseMatrix;
    use ndarray::{Array2, array};

    #[test]
    fn test_rank_one_is_encoded_scalar() {
        let output = TransformOutput::Vector(array![0.0, 1.0, 0.0]);
        assert_eq!(
            classify("LabelEncoder", ColumnShape::new(3, 1), &output).unwrap(),
            Category::EncodeScalar
        );
    }

    #[test]
    fn test_single_column_overwrites() {
        let output = TransformOutput::Matrix(array![[0.5], [1.5]]);
        assert_eq!(
            classify("StandardScaler", ColumnShape::new(2, 1), &output).unwrap(),
            Category::OverwriteScalar
        );
    }

    #[test]
    fn test_normalizer_single_column_is_noop() {
        let output = TransformOutput::Matrix(array![[1.0], [1.0]]);
        assert_eq!(
            classify("Normalizer", ColumnShape::new(2, 1), &output).unwrap(),
            Category::NoOp
        );
    }

    #[test]
    fn test_sparse_and_wide_outputs_expand() {
        let sparse = TransformOutput::Sparse(SparseMatrix::from_rows(
            3,
            &[vec![(0, 1.0)], vec![(2, 1.0)]],
        ));
        assert_eq!(
            classify("OneHotEncoder", ColumnShape::new(2, 1), &sparse).unwrap(),
            Category::ExpandColumns { width: 3 }
        );

        let empty = TransformOutput::Matrix(Array2::zeros((2, 0)));
        let category = classify("SimpleImputer", ColumnShape::new(2, 1), &empty).unwrap();
        assert_eq!(category, Category::ExpandColumns { width: 0 });
    }

    #[test]
    fn test_row_mismatch_is_an_error() {
        let output = TransformOutput::Vector(array![1.0]);
        assert!(matches!(
            classify("LabelEncoder", ColumnShape::new(2, 1), &output),
            Err(TransformError::RowMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
