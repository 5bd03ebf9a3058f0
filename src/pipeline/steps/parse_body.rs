use async_trait::async_trait;
use serde_json::Value;

use crate::pipeline::responses::{bad_request_failure, data_validation_failure, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::ValidationFailures;

pub struct ParseBodyStep;

#[async_trait]
impl PipelineStep for ParseBodyStep {
    fn name(&self) -> &'static str {
        "ParseBody"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let body = ctx.frontend_request.body.as_deref().unwrap_or("");
        if body.trim().is_empty() {
            let response = bad_request_failure(
                "A non-empty request body is required.",
                ctx.trace_id(),
                &ValidationFailures::new(),
                &[],
            );
            ctx.respond(response);
            return Ok(());
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value @ Value::Object(_)) => {
                ctx.parsed_body = value;
            }
            Ok(_) => {
                let mut failures = ValidationFailures::new();
                failures.add("$", "The request body must be a JSON object.");
                let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
                ctx.respond(response);
            }
            Err(e) => {
                tracing::debug!("Malformed request body: {} - {}", e, ctx.trace_id());
                let mut failures = ValidationFailures::new();
                failures.add("$", e.to_string());
                let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
                ctx.respond(response);
            }
        }
        Ok(())
    }
}
