//! Loading uploaded and transformed tables.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::{IngestError, Result};
use crate::index_json::read_index_json;

/// File name prefix of uploaded tables (`O_<id>.csv`, `O_<id>.json`).
pub const ORIGINAL_PREFIX: &str = "O_";

/// File name prefix of transformed datasets (`P_<job>.json`).
pub const TRANSFORMED_PREFIX: &str = "P_";

const ORIGINAL_EXTENSIONS: [&str; 2] = ["csv", "json"];

/// File name of the transformed dataset produced by a job.
pub fn transformed_file_name(job_id: u64) -> String {
    format!("{TRANSFORMED_PREFIX}{job_id}.json")
}

/// Finds the uploaded table for a dataset id, trying CSV before JSON lines.
pub fn locate_original(dir: &Path, id: u64) -> Result<PathBuf> {
    ORIGINAL_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{ORIGINAL_PREFIX}{id}.{ext}")))
        .find(|path| path.is_file())
        .ok_or_else(|| IngestError::DatasetNotFound {
            id,
            dir: dir.to_path_buf(),
        })
}

/// Loads the uploaded table of a dataset and checks its shape.
pub fn read_original(dir: &Path, id: u64) -> Result<DataFrame> {
    let path = locate_original(dir, id)?;
    let df = read_table(&path)?;
    validate_dataframe_shape(&df, &path)?;
    Ok(df)
}

/// Reads a table into a DataFrame, choosing the parser from the file name.
///
/// - `.csv`: header row, schema inferred from the first 100 rows
/// - `P_*.json`: index-oriented JSON written by [`crate::write_index_json`]
/// - other `.json`, `.jsonl`, `.ndjson`: one JSON object per line
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let is_transformed = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TRANSFORMED_PREFIX));

    let df = match extension.as_str() {
        "csv" => read_csv(path)?,
        "json" if is_transformed => read_index_json(path)?,
        "json" | "jsonl" | "ndjson" => read_json_lines(path)?,
        _ => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            });
        }
    };

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| parse_error(path, &e))?
        .finish()
        .map_err(|e| parse_error(path, &e))
}

fn read_json_lines(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| IngestError::Io {
        operation: "open",
        path: path.to_path_buf(),
        source: e,
    })?;
    JsonLineReader::new(file)
        .finish()
        .map_err(|e| parse_error(path, &e))
}

fn parse_error(path: &Path, err: &PolarsError) -> IngestError {
    IngestError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Validate DataFrame shape after loading.
///
/// Rejects tables without rows or with blank column names and warns about
/// very wide tables.
fn validate_dataframe_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyDataFrame {
            path: path.to_path_buf(),
        });
    }

    if df.width() > 500 {
        tracing::warn!(
            path = %path.display(),
            columns = df.width(),
            "Dataset has more than 500 columns - may impact performance"
        );
    }

    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}
