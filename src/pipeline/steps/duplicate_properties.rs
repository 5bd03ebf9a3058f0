use async_trait::async_trait;

use crate::pipeline::responses::{data_validation_failure, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::validation::{check_duplicate_properties, DuplicatePropertyStrategy};

/// Rejects bodies that repeat a key within one object, reporting every site
pub struct DuplicatePropertiesStep {
    strategy: DuplicatePropertyStrategy,
}

impl DuplicatePropertiesStep {
    pub fn new(strategy: DuplicatePropertyStrategy) -> Self {
        Self { strategy }
    }
}

#[async_trait]
impl PipelineStep for DuplicatePropertiesStep {
    fn name(&self) -> &'static str {
        "DuplicateProperties"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let body = ctx.frontend_request.body.as_deref().unwrap_or("");
        let failures = check_duplicate_properties(body, self.strategy)
            .map_err(|e| PipelineError::Internal(format!("body rescan failed: {}", e)))?;

        if !failures.is_empty() {
            tracing::debug!("Duplicate properties at {:?} - {}", failures.paths().collect::<Vec<_>>(), ctx.trace_id());
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
