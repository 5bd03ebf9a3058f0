use async_trait::async_trait;

use crate::pipeline::responses::{data_validation_failure, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::validation::validate_equality_constraints;

pub struct ValidateEqualityConstraintStep;

#[async_trait]
impl PipelineStep for ValidateEqualityConstraintStep {
    fn name(&self) -> &'static str {
        "ValidateEqualityConstraint"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(resource) = ctx.resource_schema.clone() else {
            return Ok(());
        };

        let failures = validate_equality_constraints(&ctx.parsed_body, &resource.equality_constraints);
        if !failures.is_empty() {
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
