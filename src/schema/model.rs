use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::schema::flattening::{AbstractFlatteningMetadata, FlatteningMetadata};
use crate::types::{BaseResourceInfo, LogicalType};

/// Top-level ApiSchema file: `{ "projectSchema": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSchemaDocument {
    pub project_schema: Option<ProjectSchema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSchema {
    pub project_name: String,
    pub project_version: String,
    pub project_endpoint_name: String,
    pub is_extension_project: bool,
    pub description: String,
    /// Keyed by endpoint name (`schools`, `classPeriods`, ...)
    pub resource_schemas: Option<IndexMap<String, Arc<ResourceSchema>>>,
    pub abstract_resources: IndexMap<String, AbstractResourceSchema>,
}

impl ProjectSchema {
    pub fn resources(&self) -> impl Iterator<Item = (&String, &Arc<ResourceSchema>)> {
        self.resource_schemas.iter().flat_map(|m| m.iter())
    }

    /// Endpoint lookup is case-insensitive, matching how clients type URLs
    pub fn find_resource_by_endpoint(&self, endpoint_name: &str) -> Option<&Arc<ResourceSchema>> {
        self.resources()
            .find(|(endpoint, _)| endpoint.eq_ignore_ascii_case(endpoint_name))
            .map(|(_, resource)| resource)
    }

    pub fn find_resource_by_name(&self, resource_name: &str) -> Option<&Arc<ResourceSchema>> {
        self.resources()
            .find(|(key, resource)| resource.resource_name == resource_name || *key == resource_name)
            .map(|(_, resource)| resource)
    }

    pub fn is_abstract(&self, resource_name: &str) -> bool {
        self.abstract_resources.contains_key(resource_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbstractResourceSchema {
    pub identity_json_paths: Vec<String>,
    pub flattening_metadata: Option<AbstractFlatteningMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualityConstraint {
    pub source_json_path: String,
    pub target_json_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceJsonPaths {
    /// Path in the referenced resource's own identity (`$.schoolId`)
    pub identity_json_path: String,
    /// Path of the same value inside the referencing body
    pub reference_json_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentPath {
    pub is_reference: bool,
    pub is_descriptor: bool,
    pub project_name: String,
    pub resource_name: String,
    pub path: Option<String>,
    pub reference_json_paths: Vec<ReferenceJsonPaths>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFieldPath {
    pub path: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl QueryFieldPath {
    pub fn logical_type(&self) -> LogicalType {
        LogicalType::from_schema_type(&self.field_type)
    }
}

/// Precision limits for one decimal property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalPropertyValidationInfo {
    pub path: String,
    pub total_digits: Option<u32>,
    pub decimal_places: Option<u32>,
}

/// Items of the array addressed by `paths` must differ in the combined values
/// at those paths. Nested constraints run once per element matched by their
/// `base_path`, with `paths` relative to that element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrayUniquenessConstraint {
    pub base_path: Option<String>,
    pub paths: Vec<String>,
    pub nested_constraints: Vec<ArrayUniquenessConstraint>,
}

/// Per-resource facts consumed by the pipeline and the DDL engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSchema {
    pub resource_name: String,
    pub is_descriptor: bool,
    pub is_school_year_enumeration: bool,
    pub is_resource_extension: bool,
    pub allow_identity_updates: bool,
    pub json_schema_for_insert: Value,
    pub identity_json_paths: Vec<String>,
    pub boolean_json_paths: Vec<String>,
    pub numeric_json_paths: Vec<String>,
    pub date_json_paths: Vec<String>,
    pub date_time_json_paths: Vec<String>,
    pub decimal_property_validation_infos: Vec<DecimalPropertyValidationInfo>,
    pub array_uniqueness_constraints: Vec<ArrayUniquenessConstraint>,
    pub equality_constraints: Vec<EqualityConstraint>,
    pub document_paths_mapping: IndexMap<String, DocumentPath>,
    pub query_field_mapping: IndexMap<String, Vec<QueryFieldPath>>,
    pub is_subclass: bool,
    pub subclass_type: Option<String>,
    pub superclass_resource_name: Option<String>,
    pub superclass_project_name: Option<String>,
    pub superclass_identity_json_path: Option<String>,
    pub flattening_metadata: Option<FlatteningMetadata>,
}

impl ResourceSchema {
    /// The update schema is the insert schema plus a required `id` string
    pub fn json_schema_for_update(&self) -> Value {
        let mut schema = self.json_schema_for_insert.clone();
        if let Some(object) = schema.as_object_mut() {
            let properties = object
                .entry("properties")
                .or_insert_with(|| json!({}));
            if let Some(properties) = properties.as_object_mut() {
                properties.insert("id".to_string(), json!({"type": "string"}));
            }
            let required = object.entry("required").or_insert_with(|| json!([]));
            if let Some(required) = required.as_array_mut() {
                if !required.iter().any(|r| r == "id") {
                    required.push(json!("id"));
                }
            }
        }
        schema
    }

    /// Document (non-descriptor) reference groups in declaration order
    pub fn document_references(&self) -> impl Iterator<Item = (&String, &DocumentPath)> {
        self.document_paths_mapping
            .iter()
            .filter(|(_, p)| p.is_reference && !p.is_descriptor)
    }

    pub fn descriptor_references(&self) -> impl Iterator<Item = (&String, &DocumentPath)> {
        self.document_paths_mapping
            .iter()
            .filter(|(_, p)| p.is_reference && p.is_descriptor)
    }

    pub fn superclass(&self) -> Option<BaseResourceInfo> {
        if !self.is_subclass {
            return None;
        }
        Some(BaseResourceInfo {
            project_name: self.superclass_project_name.clone()?,
            resource_name: self.superclass_resource_name.clone()?,
            is_descriptor: false,
        })
    }
}
