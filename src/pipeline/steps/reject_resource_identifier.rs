use async_trait::async_trait;

use crate::pipeline::responses::bad_request_failure;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::ValidationFailures;

/// On insert, the server assigns `id`; a body that carries one is rejected
pub struct RejectResourceIdentifierStep;

#[async_trait]
impl PipelineStep for RejectResourceIdentifierStep {
    fn name(&self) -> &'static str {
        "RejectResourceIdentifier"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if ctx.parsed_body.get("id").is_some() {
            let response = bad_request_failure(
                "The request data was constructed incorrectly.",
                ctx.trace_id(),
                &ValidationFailures::new(),
                &["Resource identifiers cannot be assigned by the client. The 'id' property should not be included in the request body.".to_string()],
            );
            ctx.respond(response);
        }
        Ok(())
    }
}
