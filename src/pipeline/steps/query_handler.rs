use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::database::{DocumentStore, QueryRequest};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::FrontendResponse;

pub const TOTAL_COUNT_HEADER: &str = "Total-Count";

pub struct QueryHandlerStep {
    store: Arc<dyn DocumentStore>,
}

impl QueryHandlerStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PipelineStep for QueryHandlerStep {
    fn name(&self) -> &'static str {
        "QueryHandler"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let resource_info = ctx
            .resource_info
            .clone()
            .ok_or_else(|| PipelineError::Internal("resource info missing before query".into()))?;

        let result = self
            .store
            .query(QueryRequest {
                resource_info,
                query_elements: ctx.query_elements.clone(),
                pagination: ctx.pagination,
            })
            .await?;

        tracing::debug!(
            "Query matched {} documents, returning {} - {}",
            result.total_count,
            result.documents.len(),
            ctx.trace_id()
        );

        let mut response = FrontendResponse::new(200, Some(Value::Array(result.documents)));
        if ctx.pagination.total_count {
            response = response.with_header(TOTAL_COUNT_HEADER, result.total_count.to_string());
        }
        ctx.respond(response);
        Ok(())
    }
}
