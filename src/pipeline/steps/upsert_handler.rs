use async_trait::async_trait;
use std::sync::Arc;

use crate::database::{DocumentStore, UpsertRequest, UpsertResult};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::{DocumentUuid, FrontendResponse};

/// Terminal POST step: insert a new identity (201) or replace the document
/// already holding it (200). Both carry a Location path.
pub struct UpsertHandlerStep {
    store: Arc<dyn DocumentStore>,
}

impl UpsertHandlerStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

pub(crate) fn location_path(ctx: &RequestContext, id: DocumentUuid) -> String {
    match &ctx.path_components {
        Some(path) => format!("/{}/{}/{}", path.project_namespace, path.endpoint_name, id),
        None => format!("/{}", id),
    }
}

#[async_trait]
impl PipelineStep for UpsertHandlerStep {
    fn name(&self) -> &'static str {
        "UpsertHandler"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let resource_info = ctx
            .resource_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("resource info missing before upsert".into()))?;
        let document_info = ctx
            .document_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("document info missing before upsert".into()))?;

        let result = self
            .store
            .upsert(UpsertRequest {
                resource_info,
                document_info,
                body: ctx.parsed_body.clone(),
                candidate_uuid: DocumentUuid::new(),
            })
            .await?;

        let response = match result {
            UpsertResult::Inserted(id) => FrontendResponse::new(201, None).with_location(location_path(ctx, id)),
            UpsertResult::Updated(id) => FrontendResponse::new(200, None).with_location(location_path(ctx, id)),
        };
        ctx.respond(response);
        Ok(())
    }
}
