//! Fitted transformer artifacts.
//!
//! Each fitted step is written once as `T_<job>_<n>.json` holding the
//! descriptor it was resolved from and the transformer state. Artifacts are
//! read-only after the write and are restored through the registry.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabprep_model::TransformDescriptor;
use tabprep_transform::{Transformer, TransformError, TransformerRegistry};

use crate::error::{PipelineError, Result};

/// Prefix of artifact file names.
pub const ARTIFACT_PREFIX: &str = "T_";

/// File name of the `sequence`-th artifact of a job.
pub fn artifact_file_name(job_id: u64, sequence: usize) -> String {
    format!("{ARTIFACT_PREFIX}{job_id}_{sequence}.json")
}

/// Persisted form of a fitted transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub function_name: String,
    pub descriptor: TransformDescriptor,
    pub state: Value,
}

impl ArtifactRecord {
    pub fn capture(
        descriptor: &TransformDescriptor,
        transformer: &dyn Transformer,
    ) -> std::result::Result<Self, TransformError> {
        Ok(Self {
            function_name: transformer.name().to_string(),
            descriptor: descriptor.clone(),
            state: transformer.state()?,
        })
    }

    /// Rebuild the fitted transformer.
    pub fn restore(
        &self,
        registry: &TransformerRegistry,
    ) -> std::result::Result<Box<dyn Transformer>, TransformError> {
        let path = registry
            .resolve_path(&self.descriptor)
            .ok_or_else(|| TransformError::UnknownTransform {
                qualified_name: self.descriptor.qualified_name(),
            })?;
        registry.restore(path, self.state.clone())
    }
}

/// Directory of artifact files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Write an artifact atomically (temp file + rename).
    pub fn save(&self, file_name: &str, record: &ArtifactRecord) -> Result<()> {
        let path = self.path_of(file_name);
        let bytes = serde_json::to_vec(record).map_err(|source| PipelineError::ArtifactJson {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| PipelineError::io("create directory", &self.dir, e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file =
            File::create(&temp_path).map_err(|e| PipelineError::io("create", &temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| PipelineError::io("write", &temp_path, e))?;
        file.sync_all()
            .map_err(|e| PipelineError::io("sync", &temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| PipelineError::io("rename", &temp_path, e))?;

        tracing::debug!(path = %path.display(), function = %record.function_name, "saved artifact");
        Ok(())
    }

    pub fn read(&self, file_name: &str) -> Result<ArtifactRecord> {
        let path = self.path_of(file_name);
        if !path.is_file() {
            return Err(PipelineError::ArtifactNotFound {
                file_name: file_name.to_string(),
                dir: self.dir.clone(),
            });
        }
        let text = fs::read_to_string(&path).map_err(|e| PipelineError::io("read", &path, e))?;
        serde_json::from_str(&text).map_err(|source| PipelineError::ArtifactJson { path, source })
    }

    /// Artifact file names in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PipelineError::io("list", &self.dir, e)),
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(ARTIFACT_PREFIX) && name.ends_with(".json"))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Remove every artifact written for a job. Failures are logged, not returned.
    pub fn remove_job(&self, job_id: u64) -> usize {
        let prefix = format!("{ARTIFACT_PREFIX}{job_id}_");
        let names = match self.list() {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(job_id, error = %e, "could not list artifacts for cleanup");
                return 0;
            }
        };
        let mut removed = 0;
        for name in names.iter().filter(|name| name.starts_with(&prefix)) {
            let path = self.path_of(name);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove artifact");
                }
            }
        }
        if removed > 0 {
            tracing::info!(job_id, removed, "removed artifacts of failed job");
        }
        removed
    }
}
