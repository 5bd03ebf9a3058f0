use async_trait::async_trait;
use std::sync::Arc;

use crate::pipeline::responses::{data_validation_failure, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::RequestMethod;
use crate::validation::{into_failures, prune_nulls, DocumentValidator};

/// Structural JSON Schema validation. POST uses the insert schema, PUT the
/// update schema (which also requires `id`).
pub struct ValidateDocumentStep {
    validator: Arc<dyn DocumentValidator>,
}

impl ValidateDocumentStep {
    pub fn new(validator: Arc<dyn DocumentValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl PipelineStep for ValidateDocumentStep {
    fn name(&self) -> &'static str {
        "ValidateDocument"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(resource) = ctx.resource_schema.clone() else {
            return Ok(());
        };

        prune_nulls(&mut ctx.parsed_body);

        let schema = match ctx.method {
            RequestMethod::Put => resource.json_schema_for_update(),
            _ => resource.json_schema_for_insert.clone(),
        };
        let errors = self.validator.validate(&schema, &ctx.parsed_body);

        if !errors.is_empty() {
            let failures = into_failures(errors);
            tracing::debug!(
                "Document validation failed for {} with {} paths - {}",
                resource.resource_name,
                failures.len(),
                ctx.trace_id()
            );
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
