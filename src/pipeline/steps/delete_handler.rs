use async_trait::async_trait;
use std::sync::Arc;

use crate::database::{DeleteResult, DocumentStore};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::FrontendResponse;

pub struct DeleteHandlerStep {
    store: Arc<dyn DocumentStore>,
}

impl DeleteHandlerStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PipelineStep for DeleteHandlerStep {
    fn name(&self) -> &'static str {
        "DeleteHandler"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let id = ctx
            .document_uuid()
            .ok_or_else(|| PipelineError::Internal("document id missing before delete".into()))?;
        let resource_info = ctx
            .resource_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("resource info missing before delete".into()))?;

        let status = match self.store.delete_by_id(&resource_info, id).await? {
            DeleteResult::Deleted => 204,
            DeleteResult::NotFound => 404,
        };
        ctx.respond(FrontendResponse::new(status, None));
        Ok(())
    }
}
