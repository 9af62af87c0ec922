//! Pipeline configuration loaded from TOML.
//!
//! ```toml
//! original_data_dir = "result/original_data"
//! output_dir = "result/preprocessed_data"
//! artifact_dir = "result/preprocess_transformer"
//! preview_rows = 5
//! catalog_path = "catalog.json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabprep_model::TransformCatalog;
use tabprep_transform::default_catalog;

use crate::error::{PipelineError, Result};

/// Directories and limits for pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where uploaded tables (`O_<id>.csv`) live.
    pub original_data_dir: PathBuf,
    /// Where transformed datasets (`P_<job>.json`) are written.
    pub output_dir: PathBuf,
    /// Where fitted artifacts (`T_<job>_<n>.json`) are written.
    pub artifact_dir: PathBuf,
    /// Row count for preview runs, at most `MAX_PREVIEW_ROWS`.
    pub preview_rows: usize,
    /// JSON catalog of transform descriptors; the built-in catalog when unset.
    pub catalog_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            original_data_dir: PathBuf::from("result/original_data"),
            output_dir: PathBuf::from("result/preprocessed_data"),
            artifact_dir: PathBuf::from("result/preprocess_transformer"),
            preview_rows: 5,
            catalog_path: None,
        }
    }
}

impl PipelineConfig {
    /// Reads a configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io("read", path, e))?;
        toml::from_str(&contents).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The configured catalog, or the built-in one.
    pub fn catalog(&self) -> Result<TransformCatalog> {
        let Some(path) = &self.catalog_path else {
            return Ok(default_catalog());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io("read", path, e))?;
        let catalog = TransformCatalog::from_json(&contents).map_err(|e| PipelineError::Catalog {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "loaded transform catalog");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: PipelineConfig = toml::from_str("preview_rows = 3").unwrap();
        assert_eq!(config.preview_rows, 3);
        assert_eq!(config.artifact_dir, PathBuf::from("result/preprocess_transformer"));
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_default_catalog_without_path() {
        let catalog = PipelineConfig::default().catalog().unwrap();
        assert_eq!(catalog.len(), 13);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabprep.toml");
        std::fs::write(&path, "preview_rows = \"many\"").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(PipelineError::Config { .. })
        ));
    }
}
