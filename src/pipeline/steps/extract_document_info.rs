//! Identity, reference and superclass extraction from a validated body.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::json_path::{value_to_string, JsonPath};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::ResourceSchema;
use crate::types::{
    BaseResourceInfo, DescriptorReference, DocumentIdentity, DocumentIdentityElement, DocumentInfo,
    DocumentReference, SuperclassIdentity,
};

pub const DESCRIPTOR_IDENTITY_PATH: &str = "$.descriptor";

fn parent_path(path: &str) -> &str {
    path.rsplit_once('.').map(|(parent, _)| parent).unwrap_or(path)
}

fn first_value(body: &Value, path: &str) -> Option<String> {
    match JsonPath::parse(path) {
        Ok(path) => path.first(body).map(value_to_string),
        Err(e) => {
            tracing::warn!("Skipping identity path: {}", e);
            None
        }
    }
}

/// Identity elements in declaration order. Descriptors are identified by
/// their lowercased `namespace#codeValue`.
pub fn extract_identity(resource: &ResourceSchema, body: &Value) -> DocumentIdentity {
    if resource.is_descriptor {
        let namespace = first_value(body, "$.namespace").unwrap_or_default();
        let code_value = first_value(body, "$.codeValue").unwrap_or_default();
        return DocumentIdentity::new(vec![DocumentIdentityElement::new(
            DESCRIPTOR_IDENTITY_PATH,
            format!("{}#{}", namespace, code_value).to_lowercase(),
        )]);
    }

    let elements = resource
        .identity_json_paths
        .iter()
        .map(|path| DocumentIdentityElement::new(path, first_value(body, path).unwrap_or_default()))
        .collect();
    DocumentIdentity::new(elements)
}

/// One reference per referencing object found in the body, grouped by the
/// concrete path of the object holding the reference values
pub fn extract_document_references(resource: &ResourceSchema, body: &Value) -> Vec<DocumentReference> {
    let mut references = Vec::new();

    for (_, document_path) in resource.document_references() {
        let Some(first) = document_path.reference_json_paths.first() else {
            continue;
        };
        let wildcard_parent = parent_path(&first.reference_json_path).to_string();
        let resource_info = BaseResourceInfo {
            project_name: document_path.project_name.clone(),
            resource_name: document_path.resource_name.clone(),
            is_descriptor: false,
        };

        let mut instances: IndexMap<String, Vec<DocumentIdentityElement>> = IndexMap::new();
        for reference_paths in &document_path.reference_json_paths {
            let Ok(path) = JsonPath::parse(&reference_paths.reference_json_path) else {
                continue;
            };
            for (concrete, value) in path.select_with_paths(body) {
                instances
                    .entry(parent_path(&concrete).to_string())
                    .or_default()
                    .push(DocumentIdentityElement::new(
                        &reference_paths.identity_json_path,
                        value_to_string(value),
                    ));
            }
        }

        references.extend(instances.into_values().map(|elements| DocumentReference {
            resource_info: resource_info.clone(),
            identity: DocumentIdentity::new(elements),
            path: wildcard_parent.clone(),
        }));
    }

    references
}

pub fn extract_descriptor_references(resource: &ResourceSchema, body: &Value) -> Vec<DescriptorReference> {
    let mut references = Vec::new();

    for (_, document_path) in resource.descriptor_references() {
        let Some(raw_path) = &document_path.path else {
            continue;
        };
        let Ok(path) = JsonPath::parse(raw_path) else {
            continue;
        };
        let resource_info = BaseResourceInfo {
            project_name: document_path.project_name.clone(),
            resource_name: document_path.resource_name.clone(),
            is_descriptor: true,
        };

        for value in path.select(body) {
            let Some(uri) = value.as_str() else {
                continue;
            };
            references.push(DescriptorReference {
                resource_info: resource_info.clone(),
                identity: DocumentIdentity::new(vec![DocumentIdentityElement::new(
                    DESCRIPTOR_IDENTITY_PATH,
                    uri.to_lowercase(),
                )]),
                path: raw_path.clone(),
            });
        }
    }

    references
}

/// Associations keep their identity; other subclasses rename their single
/// identity element to the superclass identity path
pub fn superclass_identity(resource: &ResourceSchema, identity: &DocumentIdentity) -> Option<SuperclassIdentity> {
    let resource_info = resource.superclass()?;

    let is_association = resource.subclass_type.as_deref() == Some("association");
    let identity = match (&resource.superclass_identity_json_path, identity.elements()) {
        (Some(superclass_path), [element]) if !is_association => DocumentIdentity::new(vec![
            DocumentIdentityElement::new(superclass_path, element.identity_value.clone()),
        ]),
        _ => identity.clone(),
    };

    Some(SuperclassIdentity { resource_info, identity })
}

pub fn extract_document_info(resource: &ResourceSchema, body: &Value) -> DocumentInfo {
    let document_identity = extract_identity(resource, body);
    let superclass_identity = superclass_identity(resource, &document_identity);
    DocumentInfo {
        document_references: extract_document_references(resource, body),
        descriptor_references: extract_descriptor_references(resource, body),
        superclass_identity,
        document_identity,
    }
}

pub struct ExtractDocumentInfoStep;

#[async_trait]
impl PipelineStep for ExtractDocumentInfoStep {
    fn name(&self) -> &'static str {
        "ExtractDocumentInfo"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if let Some(resource) = ctx.resource_schema.clone() {
            ctx.document_info = Some(extract_document_info(&resource, &ctx.parsed_body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ApiSchemaDocuments;
    use serde_json::json;
    use std::sync::Arc;

    fn resource(endpoint: &str) -> Arc<ResourceSchema> {
        let documents = ApiSchemaDocuments::sample().unwrap();
        documents
            .find_project_by_namespace("ed-fi")
            .and_then(|p| p.find_resource_by_endpoint(endpoint))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_identity_follows_declaration_order_not_body_order() {
        let class_period = resource("classPeriods");
        let a = json!({"classPeriodName": "First", "schoolReference": {"schoolId": 255901}});
        let b = json!({"schoolReference": {"schoolId": 255901}, "classPeriodName": "First"});

        let identity = extract_identity(&class_period, &a);
        assert_eq!(identity, extract_identity(&class_period, &b));
        assert_eq!(
            identity.elements(),
            &[
                DocumentIdentityElement::new("$.classPeriodName", "First"),
                DocumentIdentityElement::new("$.schoolReference.schoolId", "255901"),
            ]
        );
    }

    #[test]
    fn test_descriptor_identity_is_lowercased_uri() {
        let descriptor = resource("gradeLevelDescriptors");
        let body = json!({"namespace": "uri://ed-fi.org/GradeLevelDescriptor", "codeValue": "Ninth grade", "shortDescription": "9"});
        let identity = extract_identity(&descriptor, &body);
        assert_eq!(
            identity.value_of(DESCRIPTOR_IDENTITY_PATH),
            Some("uri://ed-fi.org/gradeleveldescriptor#ninth grade")
        );
    }

    #[test]
    fn test_references_are_grouped_per_collection_item() {
        let bell_schedule = resource("bellSchedules");
        let body = json!({
            "bellScheduleName": "Normal",
            "schoolReference": {"schoolId": 1},
            "classPeriods": [
                {"classPeriodReference": {"classPeriodName": "A", "schoolId": 1}},
                {"classPeriodReference": {"classPeriodName": "B", "schoolId": 1}}
            ],
            "gradeLevels": [{"gradeLevelDescriptor": "uri://ed-fi.org/GradeLevelDescriptor#Ninth grade"}]
        });

        let info = extract_document_info(&bell_schedule, &body);
        let class_periods: Vec<_> = info
            .document_references
            .iter()
            .filter(|r| r.resource_info.resource_name == "ClassPeriod")
            .collect();
        assert_eq!(class_periods.len(), 2);
        assert_eq!(class_periods[1].identity.value_of("$.classPeriodName"), Some("B"));
        assert_eq!(class_periods[1].path, "$.classPeriods[*].classPeriodReference");

        assert_eq!(info.descriptor_references.len(), 1);
        assert_eq!(
            info.descriptor_references[0].identity.value_of(DESCRIPTOR_IDENTITY_PATH),
            Some("uri://ed-fi.org/gradeleveldescriptor#ninth grade")
        );
    }

    #[test]
    fn test_subclass_identity_is_renamed_to_superclass_path() {
        let school = resource("schools");
        let info = extract_document_info(&school, &json!({"schoolId": 255901}));
        let superclass = info.superclass_identity.unwrap();

        assert_eq!(superclass.resource_info.resource_name, "EducationOrganization");
        assert_eq!(superclass.identity.value_of("$.educationOrganizationId"), Some("255901"));
    }
}
