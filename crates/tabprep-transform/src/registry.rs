//! Transformer registry.
//!
//! Maps descriptor paths (`library.object.function`) to factories that build a
//! transformer with default parameters or restore a fitted one from its
//! persisted state.
//!
//! # Resolution
//!
//! Lookup happens in two stages:
//! 1. the exact `library.object.function` path
//! 2. any registered path under `library.` that ends in `.function`, for
//!    descriptors whose object names a nested module
//!
//! # Example
//!
//! ```ignore
//! use tabprep_transform::default_registry;
//!
//! let transformer = default_registry().resolve(&descriptor)?;
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{Value, json};
use tabprep_model::{CatalogEntry, DROP_COLUMNS, TransformCatalog, TransformDescriptor};

use crate::builtin::{
    Binarizer, KBinsDiscretizer, LabelBinarizer, LabelEncoder, MaxAbsScaler, MinMaxScaler,
    Normalizer, OneHotEncoder, OrdinalEncoder, RobustScaler, SimpleImputer, StandardScaler,
};
use crate::error::{Result, TransformError};
use crate::params::apply_overrides;
use crate::transformer::Transformer;

/// Builds a transformer with defaults, or restores one from persisted state.
#[derive(Debug, Clone, Copy)]
pub struct TransformerFactory {
    build: fn() -> Box<dyn Transformer>,
    restore: fn(Value) -> Result<Box<dyn Transformer>>,
}

impl TransformerFactory {
    pub fn new(
        build: fn() -> Box<dyn Transformer>,
        restore: fn(Value) -> Result<Box<dyn Transformer>>,
    ) -> Self {
        Self { build, restore }
    }

    pub fn build(&self) -> Box<dyn Transformer> {
        (self.build)()
    }

    pub fn restore(&self, state: Value) -> Result<Box<dyn Transformer>> {
        (self.restore)(state)
    }
}

/// Registry of transformer factories keyed by dotted path.
///
/// The registry is read-only once built and shared across jobs.
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    factories: BTreeMap<String, TransformerFactory>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a dotted path, replacing any previous one.
    pub fn register(&mut self, path: impl Into<String>, factory: TransformerFactory) {
        self.factories.insert(path.into(), factory);
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered path a descriptor resolves to, if any.
    pub fn resolve_path(&self, descriptor: &TransformDescriptor) -> Option<&str> {
        let exact = descriptor.qualified_name();
        if let Some((path, _)) = self.factories.get_key_value(&exact) {
            tracing::debug!(path = %path, "resolved transformer");
            return Some(path);
        }

        let prefix = format!("{}.", descriptor.library_name);
        let suffix = format!(".{}", descriptor.function_name);
        let fallback = self
            .factories
            .keys()
            .find(|path| path.starts_with(&prefix) && path.ends_with(&suffix));
        match fallback {
            Some(path) => {
                tracing::debug!(requested = %exact, path = %path, "resolved transformer by module fallback");
                Some(path)
            }
            None => {
                tracing::debug!(requested = %exact, "no transformer registered");
                None
            }
        }
    }

    /// Instantiates the transformer for a descriptor and applies its base parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::UnknownTransform`] when no factory matches and
    /// [`TransformError::ParameterSyntax`] when a base parameter is rejected.
    pub fn resolve(&self, descriptor: &TransformDescriptor) -> Result<Box<dyn Transformer>> {
        let factory = self
            .resolve_path(descriptor)
            .and_then(|path| self.factories.get(path))
            .ok_or_else(|| {
                tracing::error!(
                    library = %descriptor.library_name,
                    object = %descriptor.object_name,
                    function = %descriptor.function_name,
                    "transformer could not be resolved"
                );
                TransformError::UnknownTransform {
                    qualified_name: descriptor.qualified_name(),
                }
            })?;
        let mut transformer = factory.build();
        apply_overrides(transformer.as_mut(), &descriptor.base_parameters)?;
        Ok(transformer)
    }

    /// Restores a fitted transformer registered under `path`.
    pub fn restore(&self, path: &str, state: Value) -> Result<Box<dyn Transformer>> {
        let factory = self
            .factories
            .get(path)
            .ok_or_else(|| TransformError::UnknownTransform {
                qualified_name: path.to_string(),
            })?;
        factory.restore(state)
    }
}

fn boxed<T: Transformer + Default + 'static>() -> Box<dyn Transformer> {
    Box::new(T::default())
}

const PREPROCESSING: &str = "sklearn.preprocessing";

/// Cached default registry with all built-in transformers.
static DEFAULT_REGISTRY: OnceLock<TransformerRegistry> = OnceLock::new();

/// Returns the default registry, built on first access.
pub fn default_registry() -> &'static TransformerRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    let preprocessing: [(&str, TransformerFactory); 11] = [
        (
            Binarizer::NAME,
            TransformerFactory::new(boxed::<Binarizer>, Binarizer::restore),
        ),
        (
            KBinsDiscretizer::NAME,
            TransformerFactory::new(boxed::<KBinsDiscretizer>, KBinsDiscretizer::restore),
        ),
        (
            LabelBinarizer::NAME,
            TransformerFactory::new(boxed::<LabelBinarizer>, LabelBinarizer::restore),
        ),
        (
            LabelEncoder::NAME,
            TransformerFactory::new(boxed::<LabelEncoder>, LabelEncoder::restore),
        ),
        (
            MaxAbsScaler::NAME,
            TransformerFactory::new(boxed::<MaxAbsScaler>, MaxAbsScaler::restore),
        ),
        (
            MinMaxScaler::NAME,
            TransformerFactory::new(boxed::<MinMaxScaler>, MinMaxScaler::restore),
        ),
        (
            Normalizer::NAME,
            TransformerFactory::new(boxed::<Normalizer>, Normalizer::restore),
        ),
        (
            OneHotEncoder::NAME,
            TransformerFactory::new(boxed::<OneHotEncoder>, OneHotEncoder::restore),
        ),
        (
            OrdinalEncoder::NAME,
            TransformerFactory::new(boxed::<OrdinalEncoder>, OrdinalEncoder::restore),
        ),
        (
            RobustScaler::NAME,
            TransformerFactory::new(boxed::<RobustScaler>, RobustScaler::restore),
        ),
        (
            StandardScaler::NAME,
            TransformerFactory::new(boxed::<StandardScaler>, StandardScaler::restore),
        ),
    ];
    for (name, factory) in preprocessing {
        registry.register(format!("{PREPROCESSING}.{name}"), factory);
    }
    registry.register(
        format!("sklearn.impute.{}", SimpleImputer::NAME),
        TransformerFactory::new(boxed::<SimpleImputer>, SimpleImputer::restore),
    );
    registry
}

/// Catalog matching the default registry, with `DropColumns` as the last entry.
pub fn default_catalog() -> TransformCatalog {
    let preprocessing = |id: u64, name: &str, description: &str| {
        CatalogEntry::new(id, TransformDescriptor::new("sklearn", "preprocessing", name))
            .with_description(description)
    };
    let entries = vec![
        preprocessing(1, Binarizer::NAME, "Threshold values to 0/1"),
        preprocessing(2, KBinsDiscretizer::NAME, "Bin continuous values into intervals"),
        preprocessing(3, LabelBinarizer::NAME, "One-vs-all label binarization"),
        preprocessing(4, LabelEncoder::NAME, "Encode labels as 0..n_classes-1"),
        preprocessing(5, MaxAbsScaler::NAME, "Scale by maximum absolute value"),
        preprocessing(6, MinMaxScaler::NAME, "Scale into a feature range"),
        preprocessing(7, Normalizer::NAME, "Scale rows to unit norm"),
        preprocessing(8, OneHotEncoder::NAME, "One indicator column per category"),
        preprocessing(9, OrdinalEncoder::NAME, "Encode categories as ordinal codes"),
        preprocessing(10, RobustScaler::NAME, "Scale by median and interquartile range"),
        preprocessing(11, StandardScaler::NAME, "Standardize to zero mean and unit variance"),
        CatalogEntry::new(
            12,
            TransformDescriptor::new("sklearn", "impute", SimpleImputer::NAME)
                .with_parameter("strategy", json!("mean")),
        )
        .with_description("Fill missing values"),
        CatalogEntry::new(
            13,
            TransformDescriptor::new("tabprep", "builtin", DROP_COLUMNS),
        )
        .with_description("Remove columns"),
    ];
    // Ids are literal and distinct.
    TransformCatalog::new(entries).unwrap_or_default()
}
