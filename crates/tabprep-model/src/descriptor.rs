//! Transform descriptors and the read-only transform catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Function name of the sentinel step that removes columns without fitting anything.
pub const DROP_COLUMNS: &str = "DropColumns";

/// Identifies an external transformer class and its default construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    /// Owning library (e.g. `sklearn`).
    pub library_name: String,
    /// Module or object within the library (e.g. `preprocessing`).
    pub object_name: String,
    /// Transformer class name (e.g. `StandardScaler`).
    pub function_name: String,
    /// Parameters applied right after construction.
    #[serde(default)]
    pub base_parameters: BTreeMap<String, Value>,
}

impl TransformDescriptor {
    pub fn new(
        library_name: impl Into<String>,
        object_name: impl Into<String>,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            library_name: library_name.into(),
            object_name: object_name.into(),
            function_name: function_name.into(),
            base_parameters: BTreeMap::new(),
        }
    }

    /// Add a default construction parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.base_parameters.insert(name.into(), value);
        self
    }

    /// Dotted `library.object.function` path.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.library_name, self.object_name, self.function_name
        )
    }

    /// True for the column-removal sentinel.
    pub fn is_drop_columns(&self) -> bool {
        self.function_name == DROP_COLUMNS
    }
}

/// A catalog row: a transform id bound to its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub transform_id: u64,
    #[serde(flatten)]
    pub descriptor: TransformDescriptor,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CatalogEntry {
    pub fn new(transform_id: u64, descriptor: TransformDescriptor) -> Self {
        Self {
            transform_id,
            descriptor,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Read-only mapping from transform id to descriptor.
///
/// Supplied by an external catalog service; the pipeline only consumes it.
#[derive(Debug, Clone, Default)]
pub struct TransformCatalog {
    entries: BTreeMap<u64, CatalogEntry>,
}

impl TransformCatalog {
    /// Build a catalog, rejecting duplicate transform ids.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let id = entry.transform_id;
            if map.insert(id, entry).is_some() {
                return Err(ModelError::DuplicateTransformId(id));
            }
        }
        Ok(Self { entries: map })
    }

    /// Parse a catalog from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|source| ModelError::Json {
                what: "transform catalog",
                source,
            })?;
        Self::new(entries)
    }

    pub fn to_json(&self) -> Result<String> {
        let entries: Vec<&CatalogEntry> = self.entries.values().collect();
        serde_json::to_string_pretty(&entries).map_err(|source| ModelError::Json {
            what: "transform catalog",
            source,
        })
    }

    /// Look up a descriptor by transform id.
    pub fn get(&self, transform_id: u64) -> Option<&TransformDescriptor> {
        self.entries.get(&transform_id).map(|entry| &entry.descriptor)
    }

    pub fn contains(&self, transform_id: u64) -> bool {
        self.entries.contains_key(&transform_id)
    }

    /// Entries ordered by transform id.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
