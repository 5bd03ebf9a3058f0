use async_trait::async_trait;

use crate::pipeline::responses::not_found_failure;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};

/// Resolves the project and resource schema for the path; 404 "Invalid resource" on a miss
pub struct ValidateEndpointStep;

#[async_trait]
impl PipelineStep for ValidateEndpointStep {
    fn name(&self) -> &'static str {
        "ValidateEndpoint"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let (Some(documents), Some(path)) = (ctx.api_schema.clone(), ctx.path_components.clone()) else {
            return Ok(());
        };

        let project = documents.find_project_by_namespace(&path.project_namespace);
        let resource = project.and_then(|p| p.find_resource_by_endpoint(&path.endpoint_name));

        match (project, resource) {
            (Some(project), Some(resource)) => {
                ctx.project_schema = Some(project.clone());
                ctx.resource_schema = Some(resource.clone());
            }
            _ => {
                tracing::debug!(
                    "Invalid resource {}/{} - {}",
                    path.project_namespace,
                    path.endpoint_name,
                    ctx.trace_id()
                );
                let response = not_found_failure(ctx.trace_id(), &["Invalid resource".to_string()]);
                ctx.respond(response);
            }
        }
        Ok(())
    }
}
