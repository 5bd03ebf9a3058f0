use async_trait::async_trait;

use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::ResourceInfo;

pub struct BuildResourceInfoStep {
    allow_identity_update_overrides: Vec<String>,
}

impl BuildResourceInfoStep {
    pub fn new(allow_identity_update_overrides: Vec<String>) -> Self {
        Self {
            allow_identity_update_overrides,
        }
    }
}

#[async_trait]
impl PipelineStep for BuildResourceInfoStep {
    fn name(&self) -> &'static str {
        "BuildResourceInfo"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let (Some(project), Some(resource)) = (ctx.project_schema.clone(), ctx.resource_schema.clone()) else {
            return Ok(());
        };

        let overridden = self
            .allow_identity_update_overrides
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&resource.resource_name));

        ctx.resource_info = Some(ResourceInfo {
            project_name: project.project_name.clone(),
            resource_name: resource.resource_name.clone(),
            resource_version: project.project_version.clone(),
            is_descriptor: resource.is_descriptor,
            allow_identity_updates: resource.allow_identity_updates || overridden,
        });
        Ok(())
    }
}
