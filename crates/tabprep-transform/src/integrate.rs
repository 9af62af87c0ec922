//! Column integration: apply a classified transform output to a table.

use polars::prelude::*;

use crate::column::{ColumnData, TransformOutput};
use crate::error::{Result, TransformError};
use crate::shape::Category;

/// Name of the `index`-th column produced by expanding `field`.
pub fn expanded_column_name(field: &str, index: usize) -> String {
    format!("{field}_{index}")
}

fn require_column(df: &DataFrame, field: &str) -> Result<()> {
    if df.get_column_index(field).is_none() {
        return Err(TransformError::ColumnNotFound {
            column: field.to_string(),
        });
    }
    Ok(())
}

/// Read a column as transformer input, numeric where the conversion is lossless.
pub fn read_column(df: &DataFrame, field: &str) -> Result<ColumnData> {
    require_column(df, field)?;
    let column = df.column(field)?;
    Ok(ColumnData::from_series(column.as_materialized_series()))
}

fn float_series(name: &str, values: impl Iterator<Item = f64>) -> Series {
    let data: Vec<Option<f64>> = values.map(|v| (!v.is_nan()).then_some(v)).collect();
    Series::new(name.into(), data)
}

/// Apply `output` to `df` according to `category`.
///
/// * overwrite / encode: replace the column in place, keeping its position
/// * expand: drop the column and append `<field>_0..<field>_{width-1}`
/// * no-op: leave the table untouched
///
/// # Errors
///
/// Fails if the column is missing, the output has the wrong row count, or an
/// expansion column name already exists.
pub fn integrate(
    df: &mut DataFrame,
    field: &str,
    category: Category,
    output: &TransformOutput,
) -> Result<()> {
    require_column(df, field)?;
    if output.rows() != df.height() {
        return Err(TransformError::RowMismatch {
            expected: df.height(),
            got: output.rows(),
        });
    }

    match category {
        Category::NoOp => {}
        Category::OverwriteScalar | Category::EncodeScalar => {
            let dense = output.to_dense();
            df.with_column(float_series(field, dense.column(0).iter().copied()))?;
        }
        Category::ExpandColumns { width } => {
            let dense = output.to_dense();
            let names: Vec<String> = (0..width)
                .map(|index| expanded_column_name(field, index))
                .collect();
            if let Some(existing) = names
                .iter()
                .find(|name| name.as_str() != field && df.get_column_index(name).is_some())
            {
                return Err(TransformError::DuplicateColumn {
                    column: existing.clone(),
                });
            }
            df.drop_in_place(field)?;
            for (index, name) in names.iter().enumerate() {
                df.with_column(float_series(name, dense.column(index).iter().copied()))?;
            }
        }
    }
    Ok(())
}

/// Remove a column from the table.
pub fn drop_field(df: &mut DataFrame, field: &str) -> Result<()> {
    require_column(df, field)?;
    df.drop_in_place(field)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::SparseMatrix;
    use ndarray::array;
    use tabprep_common::column_names;

    fn table() -> DataFrame {
        df!(
            "temp" => &[1.0, 2.0, 3.0],
            "season" => &["a", "b", "a"],
            "id" => &[1i64, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut df = table();
        let output = TransformOutput::Matrix(array![[0.0], [0.5], [1.0]]);
        integrate(&mut df, "temp", Category::OverwriteScalar, &output).unwrap();
        assert_eq!(column_names(&df), vec!["temp", "season", "id"]);
        let values: Vec<Option<f64>> = df
            .column("temp")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(0.0), Some(0.5), Some(1.0)]);
    }

    #[test]
    fn test_encode_replaces_text_with_codes() {
        let mut df = table();
        let output = TransformOutput::Vector(array![0.0, 1.0, 0.0]);
        integrate(&mut df, "season", Category::EncodeScalar, &output).unwrap();
        assert_eq!(df.column("season").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_expand_appends_numbered_columns() {
        let mut df = table();
        let output = TransformOutput::Sparse(SparseMatrix::from_rows(
            2,
            &[vec![(0, 1.0)], vec![(1, 1.0)], vec![(0, 1.0)]],
        ));
        integrate(&mut df, "season", Category::ExpandColumns { width: 2 }, &output).unwrap();
        assert_eq!(column_names(&df), vec!["temp", "id", "season_0", "season_1"]);
        let second: Vec<Option<f64>> = df
            .column("season_1")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(second, vec![Some(0.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn test_zero_width_expansion_removes_column() {
        let mut df = table();
        let output = TransformOutput::Matrix(ndarray::Array2::zeros((3, 0)));
        integrate(&mut df, "temp", Category::ExpandColumns { width: 0 }, &output).unwrap();
        assert_eq!(column_names(&df), vec!["season", "id"]);
    }

    #[test]
    fn test_noop_leaves_table_untouched() {
        let mut df = table();
        let output = TransformOutput::Matrix(array![[1.0], [1.0], [1.0]]);
        integrate(&mut df, "temp", Category::NoOp, &output).unwrap();
        assert!(df.equals(&table()));
    }

    #[test]
    fn test_expansion_refuses_to_overwrite_columns() {
        let mut df = df!("x" => &[1.0, 2.0], "x_1" => &[0.0, 0.0]).unwrap();
        let output = TransformOutput::Matrix(array![[1.0, 0.0], [0.0, 1.0]]);
        let err = integrate(&mut df, "x", Category::ExpandColumns { width: 2 }, &output).unwrap_err();
        assert!(matches!(err, TransformError::DuplicateColumn { ref column } if column == "x_1"));
        assert_eq!(column_names(&df), vec!["x", "x_1"]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut df = table();
        assert!(matches!(
            drop_field(&mut df, "nope"),
            Err(TransformError::ColumnNotFound { .. })
        ));
        drop_field(&mut df, "id").unwrap();
        assert_eq!(column_names(&df), vec!["temp", "season"]);
    }

    #[test]
    fn test_read_column_coerces_numbers() {
        let df = table();
        assert!(read_column(&df, "id").unwrap().is_numeric());
        assert!(!read_column(&df, "season").unwrap().is_numeric());
    }
}
