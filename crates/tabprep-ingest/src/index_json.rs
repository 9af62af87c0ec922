//! Index-oriented JSON storage for transformed datasets.
//!
//! The file is one object keyed by row index, each value an object keyed by
//! column name: `{"0": {"temp": 0.5, "season_0": 1.0}, "1": {...}}`.
//! Column order is preserved on both write and read.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use polars::prelude::*;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabprep_common::{column_names, series_to_json};

use crate::error::{IngestError, Result};

/// Write a DataFrame as index-oriented JSON.
///
/// Uses atomic write (temp file + rename) so readers never observe a partial file.
pub fn write_index_json(df: &DataFrame, path: &Path) -> Result<()> {
    let names = column_names(df);
    let columns = df
        .get_columns()
        .iter()
        .map(|column| series_to_json(column.as_materialized_series()))
        .collect::<PolarsResult<Vec<_>>>()?;
    let document = IndexRows {
        names: &names,
        columns: &columns,
        height: df.height(),
    };
    let bytes = serde_json::to_vec(&document).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IngestError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| IngestError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| IngestError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| IngestError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| IngestError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "saved transformed dataset"
    );
    Ok(())
}

/// Read an index-oriented JSON file, sorting rows by index.
pub fn read_index_json(path: &Path) -> Result<DataFrame> {
    let text = fs::read_to_string(path).map_err(|e| IngestError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    let IndexDocument(mut rows) =
        serde_json::from_str(&text).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    rows.sort_by_key(|(index, _)| *index);

    let mut names: Vec<String> = Vec::new();
    for (_, cells) in &rows {
        for (name, _) in cells {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<&Value> = rows
                .iter()
                .map(|(_, cells)| {
                    cells
                        .iter()
                        .find(|(cell_name, _)| cell_name == name)
                        .map_or(&Value::Null, |(_, value)| value)
                })
                .collect();
            json_column(name, &values)
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Builds a typed column from JSON cells: integers, floats, booleans, else strings.
fn json_column(name: &str, values: &[&Value]) -> Column {
    let non_null = || values.iter().filter(|value| !value.is_null());

    if non_null().all(|value| value.is_i64()) {
        let data: Vec<Option<i64>> = values.iter().map(|value| value.as_i64()).collect();
        if non_null().next().is_some() {
            return Column::new(name.into(), data);
        }
    }
    if non_null().all(|value| value.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|value| value.as_f64()).collect();
        return Column::new(name.into(), data);
    }
    if non_null().all(|value| value.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|value| value.as_bool()).collect();
        return Column::new(name.into(), data);
    }
    let data: Vec<Option<String>> = values
        .iter()
        .map(|value| match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Column::new(name.into(), data)
}

struct IndexRows<'a> {
    names: &'a [String],
    columns: &'a [Vec<Value>],
    height: usize,
}

impl Serialize for IndexRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.height))?;
        for row in 0..self.height {
            map.serialize_entry(
                &row.to_string(),
                &IndexRow {
                    names: self.names,
                    columns: self.columns,
                    row,
                },
            )?;
        }
        map.end()
    }
}

struct IndexRow<'a> {
    names: &'a [String],
    columns: &'a [Vec<Value>],
    row: usize,
}

impl Serialize for IndexRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, column) in self.names.iter().zip(self.columns) {
            map.serialize_entry(name, &column[self.row])?;
        }
        map.end()
    }
}

type Cells = Vec<(String, Value)>;

/// Rows in document order, each with its cells in document order.
struct IndexDocument(Vec<(u64, Cells)>);

impl<'de> Deserialize<'de> for IndexDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct OrderedCells(Cells);

impl<'de> Deserialize<'de> for OrderedCells {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(CellsVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = IndexDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by row index")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut rows = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let index = key
                .parse::<u64>()
                .map_err(|_| de::Error::custom(format!("invalid row index '{key}'")))?;
            let OrderedCells(cells) = map.next_value()?;
            rows.push((index, cells));
        }
        Ok(IndexDocument(rows))
    }
}

struct CellsVisitor;

impl<'de> Visitor<'de> for CellsVisitor {
    type Value = OrderedCells;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by column name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut cells = Vec::new();
        while let Some(entry) = map.next_entry::<String, Value>()? {
            cells.push(entry);
        }
        Ok(OrderedCells(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_uses_index_orientation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("P_1.json");
        let df = df! {
            "zeta" => [1.5, 2.5],
            "alpha" => ["x", "y"],
        }
        .unwrap();

        write_index_json(&df, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            r#"{"0":{"zeta":1.5,"alpha":"x"},"1":{"zeta":2.5,"alpha":"y"}}"#
        );
        assert!(!dir.path().join("P_1.json.tmp").exists());
    }

    #[test]
    fn test_read_sorts_rows_and_keeps_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("P_2.json");
        fs::write(
            &path,
            r#"{"10":{"b":3,"a":"z"},"2":{"b":1,"a":null},"9":{"b":2,"a":"y"}}"#,
        )
        .unwrap();

        let df = read_index_json(&path).unwrap();
        assert_eq!(column_names(&df), vec!["b", "a"]);
        let b: Vec<Option<i64>> = df.column("b").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(b, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(df.column("a").unwrap().null_count(), 1);
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("P_3.json");
        let df = df! {
            "temp" => [Some(-1.0), None, Some(1.0)],
            "flag" => [true, false, true],
        }
        .unwrap();

        write_index_json(&df, &path).unwrap();
        let back = read_index_json(&path).unwrap();

        assert_eq!(back.shape(), (3, 2));
        assert_eq!(back.column("temp").unwrap().dtype(), &DataType::Float64);
        assert_eq!(back.column("flag").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_invalid_index_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("P_4.json");
        fs::write(&path, r#"{"first":{"a":1}}"#).unwrap();

        assert!(matches!(
            read_index_json(&path),
            Err(IngestError::Json { .. })
        ));
    }
}
