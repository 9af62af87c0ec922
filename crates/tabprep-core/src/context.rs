use tabprep_model::{TransformCatalog, TransformDescriptor};
use tabprep_transform::TransformerRegistry;

use crate::error::{PipelineError, Result};

/// Read-only collaborators shared by every run: the transformer registry and
/// the transform catalog.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub registry: &'a TransformerRegistry,
    pub catalog: &'a TransformCatalog,
}

impl<'a> PipelineContext<'a> {
    pub fn new(registry: &'a TransformerRegistry, catalog: &'a TransformCatalog) -> Self {
        Self { registry, catalog }
    }

    pub fn descriptor(&self, transform_id: u64) -> Result<&'a TransformDescriptor> {
        self.catalog
            .get(transform_id)
            .ok_or(PipelineError::UnknownTransformId { transform_id })
    }
}
