//! Column transformers and the machinery around them.
//!
//! - **params**: coercion of loosely-typed overrides into [`ParamValue`]s
//! - **registry**: descriptor resolution and artifact restore
//! - **builtin**: the built-in transformer family
//! - **shape**: output shape classification into a [`Category`]
//! - **integrate**: applying a classified output to a table

pub mod builtin;
pub mod column;
pub mod error;
pub mod integrate;
pub mod params;
pub mod registry;
pub mod shape;
pub mod transformer;

// Containers
pub use column::{ColumnData, ColumnShape, SparseMatrix, TransformOutput};

// Errors
pub use error::{Result, TransformError};

// Coercion
pub use params::{ParamValue, apply_overrides, coerce, coerce_json};

// Registry
pub use registry::{TransformerFactory, TransformerRegistry, default_catalog, default_registry};

// Shape and integration
pub use integrate::{drop_field, expanded_column_name, integrate, read_column};
pub use shape::{Category, NOOP_TRANSFORMS, classify};

// Transformer capability
pub use transformer::Transformer;
