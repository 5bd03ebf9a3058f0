//! ApiSchema model: per-project, per-resource metadata loaded once at startup.

pub mod flattening;
pub mod model;
pub mod provider;

pub use flattening::*;
pub use model::*;
pub use provider::*;

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::json_path::JsonPath;

pub const SAMPLE_API_SCHEMA: &str = include_str!("../../schemas/sample-api-schema.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read ApiSchema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid ApiSchema: {0}")]
    Invalid(String),
}

/// Every loaded project schema (core plus extensions), immutable once built
#[derive(Debug, Clone, Default)]
pub struct ApiSchemaDocuments {
    projects: Vec<Arc<ProjectSchema>>,
}

impl ApiSchemaDocuments {
    pub fn new(projects: Vec<ProjectSchema>) -> Self {
        Self {
            projects: projects.into_iter().map(Arc::new).collect(),
        }
    }

    /// Accepts a single `{ "projectSchema": ... }` document or an array of them
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let documents: Vec<ApiSchemaDocument> = match value {
            Value::Array(_) => serde_json::from_value(value)?,
            other => vec![serde_json::from_value(other)?],
        };

        let mut projects = Vec::with_capacity(documents.len());
        for document in documents {
            let project = document
                .project_schema
                .ok_or_else(|| SchemaError::Invalid("document has no projectSchema".to_string()))?;
            projects.push(project);
        }

        let documents = Self::new(projects);
        documents.validate()?;
        Ok(documents)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            let value: Value = serde_yaml::from_str(&content)?;
            Self::from_value(value)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// The sample Ed-Fi subset bundled with the crate
    pub fn sample() -> Result<Self, SchemaError> {
        Self::from_json_str(SAMPLE_API_SCHEMA)
    }

    pub fn projects(&self) -> &[Arc<ProjectSchema>] {
        &self.projects
    }

    pub fn find_project_by_namespace(&self, namespace: &str) -> Option<&Arc<ProjectSchema>> {
        self.projects
            .iter()
            .find(|p| p.project_endpoint_name.eq_ignore_ascii_case(namespace))
    }

    pub fn find_project_by_name(&self, project_name: &str) -> Option<&Arc<ProjectSchema>> {
        self.projects.iter().find(|p| p.project_name == project_name)
    }

    pub fn find_resource(&self, project_name: &str, resource_name: &str) -> Option<&Arc<ResourceSchema>> {
        self.find_project_by_name(project_name)?
            .find_resource_by_name(resource_name)
    }

    /// Checks the facts later steps rely on; every problem is reported at once
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut problems = Vec::new();

        for project in &self.projects {
            if project.project_endpoint_name.trim().is_empty() {
                problems.push(format!("project '{}' has no projectEndpointName", project.project_name));
            }

            for (endpoint, resource) in project.resources() {
                if resource.resource_name.is_empty() {
                    problems.push(format!("resource at endpoint '{}' has no resourceName", endpoint));
                }

                let declared_paths = resource
                    .identity_json_paths
                    .iter()
                    .chain(&resource.boolean_json_paths)
                    .chain(&resource.numeric_json_paths)
                    .chain(&resource.date_json_paths)
                    .chain(&resource.date_time_json_paths);

                for path in declared_paths {
                    if let Err(e) = JsonPath::parse(path) {
                        problems.push(format!("{}: {}", resource.resource_name, e));
                    }
                }

                for (name, document_path) in &resource.document_paths_mapping {
                    if document_path.is_reference
                        && !document_path.is_descriptor
                        && document_path.reference_json_paths.is_empty()
                    {
                        problems.push(format!(
                            "{}: reference '{}' declares no referenceJsonPaths",
                            resource.resource_name, name
                        ));
                    }
                    if document_path.is_descriptor && document_path.path.is_none() {
                        problems.push(format!(
                            "{}: descriptor '{}' declares no path",
                            resource.resource_name, name
                        ));
                    }
                }

                if resource.is_subclass
                    && (resource.superclass_resource_name.is_none()
                        || resource.superclass_project_name.is_none())
                {
                    problems.push(format!(
                        "{}: subclass without superclass names",
                        resource.resource_name
                    ));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Invalid(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_schema_loads() {
        let documents = ApiSchemaDocuments::sample().unwrap();
        let project = documents.find_project_by_namespace("ed-fi").unwrap();
        assert_eq!(project.project_name, "Ed-Fi");
        assert!(project.find_resource_by_endpoint("schools").is_some());
        assert!(documents.find_resource("Ed-Fi", "ClassPeriod").is_some());
    }

    #[test]
    fn test_missing_project_schema_is_rejected() {
        let result = ApiSchemaDocuments::from_value(json!({"somethingElse": {}}));
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn test_validate_reports_bad_paths() {
        let result = ApiSchemaDocuments::from_value(json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "resourceSchemas": {
                    "schools": {
                        "resourceName": "School",
                        "identityJsonPaths": ["schoolId"]
                    }
                }
            }
        }));

        match result {
            Err(SchemaError::Invalid(message)) => assert!(message.contains("School")),
            other => panic!("expected invalid schema, got {:?}", other),
        }
    }
}
