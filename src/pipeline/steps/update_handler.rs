use async_trait::async_trait;
use std::sync::Arc;

use crate::database::{DocumentStore, UpdateRequest, UpdateResult};
use crate::pipeline::responses::{bad_request_failure, BAD_REQUEST_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::{FrontendResponse, ValidationFailures};

pub struct UpdateHandlerStep {
    store: Arc<dyn DocumentStore>,
}

impl UpdateHandlerStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PipelineStep for UpdateHandlerStep {
    fn name(&self) -> &'static str {
        "UpdateHandler"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let document_uuid = ctx
            .document_uuid()
            .ok_or_else(|| PipelineError::Internal("document id missing before update".into()))?;
        let resource_info = ctx
            .resource_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("resource info missing before update".into()))?;
        let document_info = ctx
            .document_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("document info missing before update".into()))?;
        let resource_name = resource_info.resource_name.clone();

        let result = self
            .store
            .update_by_id(UpdateRequest {
                resource_info,
                document_info,
                body: ctx.parsed_body.clone(),
                document_uuid,
            })
            .await?;

        let response = match result {
            UpdateResult::Updated => FrontendResponse::new(204, None),
            UpdateResult::NotFound => FrontendResponse::new(404, None),
            UpdateResult::ImmutableIdentity => bad_request_failure(
                BAD_REQUEST_DETAIL,
                ctx.trace_id(),
                &ValidationFailures::new(),
                &[format!(
                    "Identifying values for the {} resource cannot be changed. Delete and recreate the resource item instead.",
                    resource_name
                )],
            ),
        };
        ctx.respond(response);
        Ok(())
    }
}
