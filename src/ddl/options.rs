use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PLAIN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Feature switches and schema placement for one DDL run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DdlOptions {
    /// Project name (or `Extensions`) to database schema; lookups ignore case
    pub schema_mapping: IndexMap<String, String>,
    pub default_schema: String,
    pub descriptor_schema: String,
    pub use_prefixed_table_names: bool,
    pub include_extensions: bool,
    pub skip_union_views: bool,
    pub generate_foreign_key_constraints: bool,
    pub generate_natural_key_constraints: bool,
    pub generate_natural_key_views: bool,
    pub include_audit_columns: bool,
}

impl Default for DdlOptions {
    fn default() -> Self {
        let schema_mapping = [
            ("EdFi", "edfi"),
            ("ed-fi", "edfi"),
            ("Sample", "sample"),
            ("TPDM", "tpdm"),
            ("Extensions", "extensions"),
        ]
        .into_iter()
        .map(|(project, schema)| (project.to_string(), schema.to_string()))
        .collect();

        Self {
            schema_mapping,
            default_schema: "dms".to_string(),
            descriptor_schema: "dms".to_string(),
            use_prefixed_table_names: true,
            include_extensions: false,
            skip_union_views: false,
            generate_foreign_key_constraints: true,
            generate_natural_key_constraints: true,
            generate_natural_key_views: true,
            include_audit_columns: true,
        }
    }
}

impl DdlOptions {
    /// Case-insensitive schema mapping lookup. When keys differ only in case
    /// the most recently inserted one wins.
    pub fn mapped_schema(&self, key: &str) -> Option<&str> {
        self.schema_mapping
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Maps a project to a schema, replacing any entry whose key differs only in case
    pub fn set_schema(&mut self, project: &str, schema: &str) {
        self.schema_mapping.retain(|k, _| !k.eq_ignore_ascii_case(project));
        self.schema_mapping.insert(project.to_string(), schema.to_string());
    }

    /// Schema for a project: its mapping, else the lower-cased project name
    pub fn project_schema(&self, project_name: &str) -> String {
        self.mapped_schema(project_name)
            .map(str::to_string)
            .unwrap_or_else(|| project_name.to_lowercase())
    }

    /// Every problem is reported, not just the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        let mut check = |label: &str, value: &str| {
            if value.trim().is_empty() {
                problems.push(format!("{} must not be empty", label));
            } else if !PLAIN_IDENTIFIER.is_match(value) {
                problems.push(format!("{} '{}' is not a plain identifier", label, value));
            }
        };

        check("default_schema", &self.default_schema);
        check("descriptor_schema", &self.descriptor_schema);
        for (project, schema) in &self.schema_mapping {
            check(&format!("schema_mapping[{}]", project), schema);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DdlOptions::default();
        assert!(options.use_prefixed_table_names);
        assert!(!options.include_extensions);
        assert!(options.generate_natural_key_views);
        assert_eq!(options.default_schema, "dms");
        assert_eq!(options.descriptor_schema, "dms");
        assert_eq!(options.mapped_schema("ed-fi"), Some("edfi"));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_mapping_lookup_ignores_case() {
        let options = DdlOptions::default();
        assert_eq!(options.project_schema("EDFI"), "edfi");
        assert_eq!(options.project_schema("Ed-Fi"), "edfi");
        assert_eq!(options.project_schema("UnknownProject"), "unknownproject");
    }

    #[test]
    fn test_user_mapping_overrides_default_regardless_of_case() {
        let mut options = DdlOptions::default();
        options.set_schema("tpdm", "tpdm_ext");
        assert_eq!(options.project_schema("TPDM"), "tpdm_ext");
        assert_eq!(options.project_schema("tpdm"), "tpdm_ext");
        assert_eq!(
            options.schema_mapping.keys().filter(|k| k.eq_ignore_ascii_case("tpdm")).count(),
            1
        );

        // A later key that differs only in case also wins when inserted directly
        let mut options = DdlOptions::default();
        options.schema_mapping.insert("sample".into(), "sample2".into());
        assert_eq!(options.project_schema("Sample"), "sample2");
    }

    #[test]
    fn test_validate_rejects_bad_schema_names() {
        let mut options = DdlOptions::default();
        options.default_schema = String::new();
        options.descriptor_schema = "bad-name".to_string();
        options.schema_mapping.insert("TPDM".into(), "tp dm".into());

        let problems = options.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
    }
}
