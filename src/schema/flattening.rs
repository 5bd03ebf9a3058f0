//! Relational projection of a resource, as carried in `flatteningMetadata`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatteningMetadata {
    pub table: Option<TableMetadata>,
}

/// Declares the union view covering an abstract resource's subclasses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbstractFlatteningMetadata {
    pub subclass_types: Vec<String>,
    pub union_view_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableMetadata {
    pub base_name: String,
    pub json_path: String,
    pub columns: Vec<ColumnMetadata>,
    pub child_tables: Vec<TableMetadata>,
    pub discriminator_value: Option<String>,
    pub is_extension_table: bool,
}

impl TableMetadata {
    pub fn natural_key_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns
            .iter()
            .filter(|c| c.is_natural_key && !c.is_parent_reference)
    }

    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| !c.is_parent_reference)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMetadata {
    pub column_name: String,
    pub column_type: String,
    pub is_required: bool,
    pub is_natural_key: bool,
    pub is_parent_reference: bool,
    pub is_descriptor: bool,
    pub is_discriminator: bool,
    pub is_superclass_identity: bool,
    pub is_polymorphic_reference: bool,
    #[serde(deserialize_with = "lenient_u32")]
    pub max_length: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub precision: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub scale: Option<u32>,
    pub from_reference_path: Option<String>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            column_name: name.into(),
            column_type: column_type.into(),
            ..Default::default()
        }
    }

    pub fn is_descriptor_column(&self) -> bool {
        self.is_descriptor || self.column_type.eq_ignore_ascii_case("descriptor")
    }
}

/// MetaEd emits lengths as strings; hand-written schemas use numbers
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_lengths_accept_strings_and_numbers() {
        let column: ColumnMetadata = serde_json::from_value(json!({
            "columnName": "Name",
            "columnType": "string",
            "maxLength": "100",
            "precision": 9,
            "scale": ""
        }))
        .unwrap();

        assert_eq!(column.max_length, Some(100));
        assert_eq!(column.precision, Some(9));
        assert_eq!(column.scale, None);
    }

    #[test]
    fn test_natural_key_columns_skip_parent_references() {
        let mut parent = ColumnMetadata::new("School_Id", "bigint");
        parent.is_parent_reference = true;
        parent.is_natural_key = true;
        let mut key = ColumnMetadata::new("ClassPeriodName", "string");
        key.is_natural_key = true;

        let table = TableMetadata {
            base_name: "ClassPeriod".into(),
            columns: vec![parent, key],
            ..Default::default()
        };

        let names: Vec<_> = table.natural_key_columns().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["ClassPeriodName"]);
    }
}
