use async_trait::async_trait;
use std::sync::Arc;

use crate::pipeline::responses::internal_failure;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::ApiSchemaProvider;

/// Attaches the current ApiSchema snapshot to the request; 500 when none is loaded
pub struct ProvideApiSchemaStep {
    provider: Arc<dyn ApiSchemaProvider>,
}

impl ProvideApiSchemaStep {
    pub fn new(provider: Arc<dyn ApiSchemaProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PipelineStep for ProvideApiSchemaStep {
    fn name(&self) -> &'static str {
        "ProvideApiSchema"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        match self.provider.documents() {
            Some(documents) => {
                ctx.api_schema = Some(documents);
            }
            None => {
                tracing::error!("No ApiSchema is loaded - {}", ctx.trace_id());
                let response = internal_failure("ApiSchema is not available", ctx.trace_id());
                ctx.respond(response);
            }
        }
        Ok(())
    }
}
