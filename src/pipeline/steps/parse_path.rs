use async_trait::async_trait;

use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::{DocumentUuid, FrontendResponse, PathComponents, RequestMethod};

/// Splits `/<projectNamespace>/<endpointName>[/<documentUuid>]`.
/// `None` for anything that is not a resource path.
pub fn parse_path(path: &str) -> Option<PathComponents> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let (namespace, endpoint, uuid) = match segments.as_slice() {
        [namespace, endpoint] => (*namespace, *endpoint, None),
        [namespace, endpoint, uuid] => (*namespace, *endpoint, Some(*uuid)),
        _ => return None,
    };
    if namespace.is_empty() || endpoint.is_empty() {
        return None;
    }

    let document_uuid = match uuid {
        Some(raw) => Some(DocumentUuid::parse(raw)?),
        None => None,
    };

    Some(PathComponents {
        project_namespace: namespace.to_string(),
        endpoint_name: endpoint.to_string(),
        document_uuid,
    })
}

pub struct ParsePathStep;

#[async_trait]
impl PipelineStep for ParsePathStep {
    fn name(&self) -> &'static str {
        "ParsePath"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(components) = parse_path(&ctx.frontend_request.path) else {
            tracing::debug!("Unparsable resource path '{}' - {}", ctx.frontend_request.path, ctx.trace_id());
            ctx.respond(FrontendResponse::new(404, None));
            return Ok(());
        };

        let has_id = components.document_uuid.is_some();
        let allowed = match ctx.method {
            RequestMethod::Post => !has_id,
            RequestMethod::Put | RequestMethod::Delete => has_id,
            RequestMethod::Get => true,
        };
        if !allowed {
            ctx.respond(FrontendResponse::new(404, None));
            return Ok(());
        }

        ctx.path_components = Some(components);
        Ok(())
    }
}
