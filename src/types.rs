/// Shared types used across the request pipeline

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Frontend request methods supported by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMethod {
    Post,
    Get,
    Put,
    Delete,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestMethod::Post => "POST",
            RequestMethod::Get => "GET",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Correlation id carried by a request into logs and failure bodies
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentUuid(pub Uuid);

impl DocumentUuid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for DocumentUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request as handed over by the HTTP frontend. The core never sees sockets.
#[derive(Debug, Clone)]
pub struct FrontendRequest {
    pub method: RequestMethod,
    pub path: String,
    pub body: Option<String>,
    pub query_parameters: BTreeMap<String, String>,
    pub trace_id: TraceId,
}

impl FrontendRequest {
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query_parameters: BTreeMap::new(),
            trace_id: TraceId::generate(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = trace_id;
        self
    }
}

/// The terminal result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendResponse {
    pub status_code: u16,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Path of a created document, turned into a Location header by the frontend
    pub location_header_path: Option<String>,
}

impl FrontendResponse {
    pub fn new(status_code: u16, body: Option<Value>) -> Self {
        Self {
            status_code,
            body,
            headers: Vec::new(),
            location_header_path: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_location(mut self, path: impl Into<String>) -> Self {
        self.location_header_path = Some(path.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Resolved `/<projectNamespace>/<endpointName>[/<documentUuid>]` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathComponents {
    pub project_namespace: String,
    pub endpoint_name: String,
    pub document_uuid: Option<DocumentUuid>,
}

/// One `(jsonPath, value)` pair of a document identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdentityElement {
    pub identity_json_path: String,
    pub identity_value: String,
}

impl DocumentIdentityElement {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identity_json_path: path.into(),
            identity_value: value.into(),
        }
    }
}

/// Ordered identity of a document. Two identities are equal only when every
/// element matches in the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentIdentity(pub Vec<DocumentIdentityElement>);

impl DocumentIdentity {
    pub fn new(elements: Vec<DocumentIdentityElement>) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[DocumentIdentityElement] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn value_of(&self, path: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|element| element.identity_json_path == path)
            .map(|element| element.identity_value.as_str())
    }
}

/// Project and resource name pair without request-scoped flags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResourceInfo {
    pub project_name: String,
    pub resource_name: String,
    pub is_descriptor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub project_name: String,
    pub resource_name: String,
    pub resource_version: String,
    pub is_descriptor: bool,
    pub allow_identity_updates: bool,
}

impl ResourceInfo {
    pub fn base(&self) -> BaseResourceInfo {
        BaseResourceInfo {
            project_name: self.project_name.clone(),
            resource_name: self.resource_name.clone(),
            is_descriptor: self.is_descriptor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub resource_info: BaseResourceInfo,
    pub identity: DocumentIdentity,
    /// Wildcard JSON path of the reference object in the body
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorReference {
    pub resource_info: BaseResourceInfo,
    pub identity: DocumentIdentity,
    /// Wildcard JSON path the descriptor was read from
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperclassIdentity {
    pub resource_info: BaseResourceInfo,
    pub identity: DocumentIdentity,
}

/// Everything extracted from a request body that persistence needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub document_identity: DocumentIdentity,
    pub document_references: Vec<DocumentReference>,
    pub descriptor_references: Vec<DescriptorReference>,
    pub superclass_identity: Option<SuperclassIdentity>,
}

/// Logical type of a query field or coercion target, resolved once from schema metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalType {
    Number,
    Boolean,
    Date,
    DateTime,
    Time,
    String,
}

impl LogicalType {
    /// Unknown type names fall back to `String`
    pub fn from_schema_type(value: &str) -> Self {
        match value {
            "number" => LogicalType::Number,
            "boolean" => LogicalType::Boolean,
            "date" => LogicalType::Date,
            "date-time" => LogicalType::DateTime,
            "time" => LogicalType::Time,
            _ => LogicalType::String,
        }
    }
}

/// A validated, typed query term handed to the query handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryElement {
    pub query_field_name: String,
    pub document_paths: Vec<String>,
    pub value: String,
    pub logical_type: LogicalType,
}

/// Paging parameters taken from the reserved query keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationParameters {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub total_count: bool,
}

/// Path-addressed validation messages. Messages for the same path accumulate
/// in encounter order; paths keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationFailures(IndexMap<String, Vec<String>>);

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: ValidationFailures) {
        for (path, messages) in other.0 {
            self.0.entry(path).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, String)> for ValidationFailures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut failures = ValidationFailures::new();
        for (path, message) in iter {
            failures.add(path, message);
        }
        failures
    }
}
