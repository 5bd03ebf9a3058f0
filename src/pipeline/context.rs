use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::schema::{ApiSchemaDocuments, ProjectSchema, ResourceSchema};
use crate::types::{
    DocumentInfo, DocumentUuid, FrontendRequest, FrontendResponse, PaginationParameters, PathComponents,
    QueryElement, RequestMethod, ResourceInfo, TraceId,
};

/// Per-request state threaded through every pipeline step.
///
/// Derived fields stay `None` until the step responsible for them has run, so a
/// step must never assume an earlier step populated them. Once
/// `frontend_response` is set the executor runs nothing further.
#[derive(Debug)]
pub struct RequestContext {
    pub frontend_request: FrontendRequest,
    pub method: RequestMethod,

    // Schema snapshot taken once per request, so a reload mid-request is invisible
    pub api_schema: Option<Arc<ApiSchemaDocuments>>,
    pub path_components: Option<PathComponents>,
    pub project_schema: Option<Arc<ProjectSchema>>,
    pub resource_schema: Option<Arc<ResourceSchema>>,

    /// Request body; coercion steps rewrite it in place
    pub parsed_body: Value,

    pub resource_info: Option<ResourceInfo>,
    pub document_info: Option<DocumentInfo>,
    pub query_elements: Vec<QueryElement>,
    pub pagination: PaginationParameters,

    pub frontend_response: Option<FrontendResponse>,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new(frontend_request: FrontendRequest) -> Self {
        Self {
            method: frontend_request.method,
            frontend_request,
            api_schema: None,
            path_components: None,
            project_schema: None,
            resource_schema: None,
            parsed_body: Value::Null,
            resource_info: None,
            document_info: None,
            query_elements: Vec::new(),
            pagination: PaginationParameters::default(),
            frontend_response: None,
            start_time: Instant::now(),
        }
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.frontend_request.trace_id
    }

    pub fn document_uuid(&self) -> Option<DocumentUuid> {
        self.path_components.as_ref().and_then(|p| p.document_uuid)
    }

    pub fn endpoint_name(&self) -> &str {
        self.path_components
            .as_ref()
            .map(|p| p.endpoint_name.as_str())
            .unwrap_or("")
    }

    /// Sets the terminal response; later steps are skipped
    pub fn respond(&mut self, response: FrontendResponse) {
        self.frontend_response = Some(response);
    }

    pub fn is_terminal(&self) -> bool {
        self.frontend_response.is_some()
    }

    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
