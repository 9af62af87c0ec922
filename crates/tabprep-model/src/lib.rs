//! Data model for tabular transformation pipelines.
//!
//! - **descriptor**: transform descriptors and the read-only catalog
//! - **request**: fit and preview requests with field fan-out
//! - **summary**: step records and the replayable summary
//! - **classes**: original/encoded class vocabularies
//! - **error**: stable error codes and caller-facing error payloads

pub mod classes;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod summary;

pub use classes::{ClassValue, ClassVocabulary, EncodedClass};
pub use descriptor::{CatalogEntry, DROP_COLUMNS, TransformCatalog, TransformDescriptor};
pub use error::{ErrorCode, ErrorPayload, ModelError, Result};
pub use request::{FieldRequest, FitRequest, PreviewRequest};
pub use summary::{StepRecord, Summary};
