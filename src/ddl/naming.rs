//! Identifier shortening and table placement rules.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::ddl::options::DdlOptions;
use crate::schema::{ProjectSchema, ResourceSchema};

/// Hex characters of the name hash appended to a shortened identifier
pub const HASH_LENGTH: usize = 8;

static EXTENSION_PROJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]{2,5})[A-Z][a-z]").expect("valid regex"));
static EXTENSION_PROJECT_FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]{2,4})").expect("valid regex"));

/// Returns `name` unchanged when it fits, otherwise a prefix of it joined to
/// the first [`HASH_LENGTH`] hex characters of its SHA-256 by `_`.
pub fn make_identifier(name: &str, max_length: usize) -> String {
    if name.len() <= max_length {
        return name.to_string();
    }

    let hash = format!("{:x}", Sha256::digest(name.as_bytes()));
    let mut keep = max_length.saturating_sub(HASH_LENGTH + 1);
    while !name.is_char_boundary(keep) {
        keep -= 1;
    }
    format!("{}_{}", &name[..keep], &hash[..HASH_LENGTH])
}

/// `School_Id` becomes `SchoolId`; other names pass through
pub fn view_alias(column_name: &str) -> String {
    match column_name.strip_suffix("_Id") {
        Some(prefix) => format!("{}Id", prefix),
        None => column_name.to_string(),
    }
}

/// Leading project acronym of an extension resource, e.g. `TPDMStudentExtension` is `TPDM`
pub fn extension_project_name(resource_name: &str) -> Option<String> {
    let base = resource_name.strip_suffix("Extension").unwrap_or(resource_name);
    EXTENSION_PROJECT
        .captures(base)
        .or_else(|| EXTENSION_PROJECT_FALLBACK.captures(base))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_descriptor_resource(resource: &ResourceSchema) -> bool {
    resource.resource_name.ends_with("Descriptor")
}

fn is_extension_resource(resource: &ResourceSchema) -> bool {
    resource
        .flattening_metadata
        .as_ref()
        .and_then(|f| f.table.as_ref())
        .map(|t| t.is_extension_table)
        .unwrap_or(false)
}

/// Where a resource's tables live: either their own schema, or the default
/// schema with the original schema name as a table prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub original_schema: String,
    pub separate_schema: bool,
}

impl Placement {
    pub fn for_resource(project: &ProjectSchema, resource: &ResourceSchema, options: &DdlOptions) -> Self {
        if is_descriptor_resource(resource) {
            return Self {
                original_schema: options.descriptor_schema.clone(),
                separate_schema: options.descriptor_schema != options.default_schema,
            };
        }

        if is_extension_resource(resource) {
            let original_schema = match extension_project_name(&resource.resource_name) {
                Some(project_name) => options
                    .mapped_schema(&project_name)
                    .map(str::to_string)
                    .unwrap_or_else(|| project_name.to_lowercase()),
                None => options
                    .mapped_schema("Extensions")
                    .unwrap_or("extensions")
                    .to_string(),
            };
            return Self {
                original_schema,
                separate_schema: true,
            };
        }

        let original_schema = options.project_schema(&project.project_name);
        let separate_schema = !options.use_prefixed_table_names && original_schema != options.default_schema;
        Self {
            original_schema,
            separate_schema,
        }
    }

    pub fn schema<'a>(&'a self, options: &'a DdlOptions) -> &'a str {
        if self.separate_schema {
            &self.original_schema
        } else {
            &options.default_schema
        }
    }

    pub fn table_name(&self, base_name: &str, options: &DdlOptions) -> String {
        if !self.separate_schema && options.use_prefixed_table_names && self.original_schema != options.default_schema
        {
            format!("{}_{}", self.original_schema, base_name)
        } else {
            base_name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FlatteningMetadata, TableMetadata};

    #[test]
    fn test_short_names_pass_through() {
        assert_eq!(make_identifier("FK_School_Document", 63), "FK_School_Document");
        let exact = "x".repeat(63);
        assert_eq!(make_identifier(&exact, 63), exact);
    }

    #[test]
    fn test_long_names_are_shortened_deterministically() {
        let name = format!("FK_{}_{}", "StudentSchoolAssociation".repeat(3), "GraduationPlan".repeat(2));
        let first = make_identifier(&name, 63);
        let second = make_identifier(&name, 63);

        assert_eq!(first, second);
        assert_eq!(first.len(), 63);
        assert!(first.starts_with(&name[..54]));
        let suffix = &first[55..];
        assert_eq!(suffix.len(), HASH_LENGTH);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_different_long_names_get_different_hashes() {
        let a = make_identifier(&format!("{}A", "x".repeat(200)), 128);
        let b = make_identifier(&format!("{}B", "x".repeat(200)), 128);
        assert_ne!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn test_view_alias() {
        assert_eq!(view_alias("School_Id"), "SchoolId");
        assert_eq!(view_alias("ClassPeriodName"), "ClassPeriodName");
    }

    #[test]
    fn test_extension_project_name() {
        assert_eq!(extension_project_name("TPDMStudentExtension").as_deref(), Some("TPDM"));
        assert_eq!(extension_project_name("SAMPLEThing").as_deref(), Some("SAMP"));
        assert_eq!(extension_project_name("ABC").as_deref(), Some("ABC"));
        assert_eq!(extension_project_name("Student"), None);
    }

    fn resource(name: &str, extension: bool) -> ResourceSchema {
        ResourceSchema {
            resource_name: name.to_string(),
            flattening_metadata: Some(FlatteningMetadata {
                table: Some(TableMetadata {
                    base_name: name.to_string(),
                    is_extension_table: extension,
                    ..Default::default()
                }),
            }),
            ..Default::default()
        }
    }

    fn project() -> ProjectSchema {
        ProjectSchema {
            project_name: "Ed-Fi".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prefixed_placement() {
        let options = DdlOptions::default();
        let placement = Placement::for_resource(&project(), &resource("School", false), &options);

        assert_eq!(placement.schema(&options), "dms");
        assert_eq!(placement.table_name("School", &options), "edfi_School");
    }

    #[test]
    fn test_separate_schema_placement() {
        let options = DdlOptions {
            use_prefixed_table_names: false,
            ..Default::default()
        };
        let placement = Placement::for_resource(&project(), &resource("School", false), &options);

        assert_eq!(placement.schema(&options), "edfi");
        assert_eq!(placement.table_name("School", &options), "School");
    }

    #[test]
    fn test_descriptor_and_extension_placement() {
        let options = DdlOptions {
            descriptor_schema: "descriptors".into(),
            ..Default::default()
        };

        let descriptor = Placement::for_resource(&project(), &resource("GradeLevelDescriptor", false), &options);
        assert_eq!(descriptor.schema(&options), "descriptors");
        assert_eq!(descriptor.table_name("GradeLevelDescriptor", &options), "GradeLevelDescriptor");

        let extension = Placement::for_resource(&project(), &resource("TPDMStudentExtension", true), &options);
        assert_eq!(extension.schema(&options), "tpdm");
        assert!(extension.separate_schema);
    }
}
