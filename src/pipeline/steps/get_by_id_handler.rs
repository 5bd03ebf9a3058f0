use async_trait::async_trait;
use std::sync::Arc;

use crate::database::DocumentStore;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::FrontendResponse;

/// Answers GET requests that name a document id. Collection GETs fall through
/// to the query handler.
pub struct GetByIdHandlerStep {
    store: Arc<dyn DocumentStore>,
}

impl GetByIdHandlerStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PipelineStep for GetByIdHandlerStep {
    fn name(&self) -> &'static str {
        "GetByIdHandler"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(id) = ctx.document_uuid() else {
            return Ok(());
        };
        let resource_info = ctx
            .resource_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("resource info missing before get".into()))?;

        let response = match self.store.get_by_id(&resource_info, id).await? {
            Some(document) => FrontendResponse::new(200, Some(document)),
            None => FrontendResponse::new(404, None),
        };
        ctx.respond(response);
        Ok(())
    }
}
