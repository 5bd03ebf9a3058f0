use async_trait::async_trait;

use crate::pipeline::responses::{bad_request_failure, BAD_REQUEST_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::{DocumentUuid, ValidationFailures};

/// PUT: the body `id` must be a UUID equal to the one in the URL
pub struct ValidateMatchingDocumentUuidsStep;

#[async_trait]
impl PipelineStep for ValidateMatchingDocumentUuidsStep {
    fn name(&self) -> &'static str {
        "ValidateMatchingDocumentUuids"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let body_id = ctx
            .parsed_body
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(DocumentUuid::parse);

        let matches = match (body_id, ctx.document_uuid()) {
            (Some(body_id), Some(url_id)) => body_id == url_id,
            _ => false,
        };

        if !matches {
            let mut failures = ValidationFailures::new();
            failures.add("$.id", "Request body id must match the id in the url.");
            let response = bad_request_failure(BAD_REQUEST_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
