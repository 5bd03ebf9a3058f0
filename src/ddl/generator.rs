//! Two-pass table emission: every table first, then every foreign key, so
//! that a constraint never names a table that does not exist yet.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

use crate::ddl::dialect::{ColumnDefinition, ForeignKey, Index, SqlDialect, TableDefinition};
use crate::ddl::naming::Placement;
use crate::ddl::options::DdlOptions;
use crate::ddl::{union_views, views};
use crate::schema::{ColumnMetadata, ProjectSchema, ResourceSchema, TableMetadata};

pub const DOCUMENT_ID_COLUMN: &str = "Document_Id";
/// Timestamp pair then the change counter, in table order
pub const AUDIT_COLUMNS: [&str; 3] = ["CreateDate", "LastModifiedDate", "ChangeVersion"];
pub const DOCUMENT_PARTITION_KEY_COLUMN: &str = "Document_PartitionKey";

/// A resource whose root table is part of this run
#[derive(Debug, Clone)]
pub struct ResolvedResource<'a> {
    pub resource: &'a ResourceSchema,
    pub table: &'a TableMetadata,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub schema: String,
    pub name: String,
}

pub struct DdlGenerator<'a> {
    project: &'a ProjectSchema,
    dialect: &'a dyn SqlDialect,
    options: &'a DdlOptions,
    resources: IndexMap<String, ResolvedResource<'a>>,
}

impl<'a> DdlGenerator<'a> {
    pub fn new(project: &'a ProjectSchema, dialect: &'a dyn SqlDialect, options: &'a DdlOptions) -> Self {
        let mut resources = IndexMap::new();

        for (_, resource) in project.resources() {
            let Some(table) = resource.flattening_metadata.as_ref().and_then(|f| f.table.as_ref()) else {
                continue;
            };
            if table.is_extension_table && !options.include_extensions {
                tracing::debug!("Skipping extension table {}", table.base_name);
                continue;
            }

            let placement = Placement::for_resource(project, resource, options);
            resources.insert(
                resource.resource_name.clone(),
                ResolvedResource {
                    resource: &**resource,
                    table,
                    placement,
                },
            );
        }

        Self {
            project,
            dialect,
            options,
            resources,
        }
    }

    pub fn project(&self) -> &'a ProjectSchema {
        self.project
    }

    pub fn dialect(&self) -> &'a dyn SqlDialect {
        self.dialect
    }

    pub fn options(&self) -> &'a DdlOptions {
        self.options
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResolvedResource<'a>> {
        self.resources.values()
    }

    pub fn resource(&self, resource_name: &str) -> Option<&ResolvedResource<'a>> {
        self.resources.get(resource_name).or_else(|| {
            self.resources
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(resource_name))
                .map(|(_, r)| r)
        })
    }

    /// Final schema and (possibly shortened) name of a table of `resource`
    pub fn location(&self, resource: &ResolvedResource<'_>, base_name: &str) -> TableLocation {
        TableLocation {
            schema: resource.placement.schema(self.options).to_string(),
            name: self
                .dialect
                .identifier(&resource.placement.table_name(base_name, self.options)),
        }
    }

    /// Resource a column points at. Declared provenance wins; the `<Resource>_Id`
    /// naming pattern is only consulted when there is none.
    pub fn resolve_reference(&self, column: &ColumnMetadata) -> Option<&ResolvedResource<'a>> {
        if column.is_parent_reference || column.is_descriptor_column() {
            return None;
        }

        let target = match &column.from_reference_path {
            Some(path) => reference_target(path)?,
            None => column.column_name.strip_suffix("_Id")?.to_string(),
        };

        if self.project.is_abstract(&target) {
            tracing::debug!(
                "Column {} references abstract resource {}, no foreign key",
                column.column_name,
                target
            );
            return None;
        }

        self.resource(&target)
    }

    pub fn generate(&self) -> String {
        let mut tables = Vec::new();
        let mut foreign_keys = Vec::new();

        for resource in self.resources.values() {
            self.emit_table(resource, resource.table, None, &mut tables, &mut foreign_keys);
        }

        let schemas: BTreeSet<&str> = self
            .resources
            .values()
            .filter(|r| r.placement.separate_schema)
            .map(|r| r.placement.schema(self.options))
            .collect();

        let mut sql = format!(
            "-- Ed-Fi DMS database schema ({})\n-- Project: {} {}\n\n",
            self.dialect.name(),
            self.project.project_name,
            self.project.project_version
        );

        for schema in schemas {
            sql.push_str(&self.dialect.create_schema(schema));
            sql.push('\n');
        }

        for table in &tables {
            sql.push_str(&self.dialect.create_table(table, &self.dialect.table_body(table)));
            sql.push('\n');
            for index in &table.indexes {
                sql.push_str(&self.dialect.create_index(table, index));
            }
            if !table.indexes.is_empty() {
                sql.push('\n');
            }
        }

        if self.options.generate_foreign_key_constraints && !foreign_keys.is_empty() {
            sql.push_str("-- Foreign Key Constraints\n\n");
            for foreign_key in &foreign_keys {
                sql.push_str(&self.dialect.add_foreign_key(foreign_key));
                sql.push('\n');
            }
        }

        if self.options.generate_natural_key_views {
            let statements = views::natural_key_views(self);
            if !statements.is_empty() {
                sql.push_str("-- Natural Key Views\n\n");
                for statement in statements {
                    sql.push_str(&statement);
                    sql.push('\n');
                }
            }
        }

        if !self.options.skip_union_views {
            let statements = union_views::union_views(self);
            if !statements.is_empty() {
                sql.push_str("-- Union Views\n\n");
                for statement in statements {
                    sql.push_str(&statement);
                    sql.push('\n');
                }
            }
        }

        tracing::info!(
            "Generated {} tables and {} foreign keys for {} ({})",
            tables.len(),
            foreign_keys.len(),
            self.project.project_name,
            self.dialect.name()
        );
        sql
    }

    fn emit_table(
        &self,
        resource: &ResolvedResource<'a>,
        table: &TableMetadata,
        parent: Option<&TableMetadata>,
        tables: &mut Vec<TableDefinition>,
        foreign_keys: &mut Vec<ForeignKey>,
    ) {
        let dialect = self.dialect;
        let location = self.location(resource, &table.base_name);
        let base = &table.base_name;

        let mut definition = TableDefinition {
            schema: location.schema.clone(),
            name: location.name.clone(),
            ..Default::default()
        };
        definition.columns.push(not_null(DOCUMENT_ID_COLUMN, "BIGINT"));
        definition.columns.push(not_null(DOCUMENT_PARTITION_KEY_COLUMN, "SMALLINT"));

        let parent_column = parent.map(|p| dialect.identifier(&format!("{}_Id", p.base_name)));
        if let Some(column) = &parent_column {
            definition.columns.push(not_null(column, "BIGINT"));
        }

        for column in table.data_columns() {
            definition.columns.push(ColumnDefinition {
                name: dialect.identifier(&column.column_name),
                sql_type: dialect.map_column_type(column),
                nullable: !(column.is_required || column.is_natural_key),
                default: None,
            });
        }

        if self.options.include_audit_columns {
            for name in &AUDIT_COLUMNS[..2] {
                definition.columns.push(ColumnDefinition {
                    name: name.to_string(),
                    sql_type: dialect.timestamp_type().to_string(),
                    nullable: false,
                    default: Some(dialect.current_timestamp().to_string()),
                });
            }
            definition.columns.push(not_null(AUDIT_COLUMNS[2], "BIGINT"));
        }

        let natural_keys: Vec<String> = table
            .natural_key_columns()
            .map(|c| dialect.identifier(&c.column_name))
            .collect();
        if self.options.generate_natural_key_constraints && !natural_keys.is_empty() {
            match &parent_column {
                None => definition
                    .unique_constraints
                    .push((dialect.identifier(&format!("UQ_{}_NaturalKey", base)), natural_keys)),
                Some(column) => {
                    let mut columns = vec![column.clone()];
                    columns.extend(natural_keys);
                    definition
                        .unique_constraints
                        .push((dialect.identifier(&format!("UQ_{}_Identity", base)), columns));
                }
            }
        }

        let mut constraint_names = HashSet::new();
        let mut add_index = |definition: &mut TableDefinition, suffix: &str, columns: Vec<String>| {
            let name = dialect.identifier(&format!("IX_{}_{}", base, suffix));
            if constraint_names.insert(name.clone()) {
                definition.indexes.push(Index { name, columns });
            }
        };

        let mut table_keys = Vec::new();
        let mut fk_names = HashSet::new();
        let mut add_foreign_key = |keys: &mut Vec<ForeignKey>, suffix: &str, fallback: &str, mut key: ForeignKey| {
            let mut name = dialect.identifier(&format!("FK_{}_{}", base, suffix));
            if !fk_names.insert(name.clone()) {
                name = dialect.identifier(&format!("FK_{}_{}", base, fallback));
                fk_names.insert(name.clone());
            }
            key.name = name;
            keys.push(key);
        };

        if let (Some(parent), Some(column)) = (parent, &parent_column) {
            let parent_location = self.location(resource, &parent.base_name);
            add_index(&mut definition, &parent.base_name, vec![column.clone()]);
            add_foreign_key(
                &mut table_keys,
                &parent.base_name,
                column,
                ForeignKey {
                    name: String::new(),
                    schema: location.schema.clone(),
                    table: location.name.clone(),
                    columns: vec![column.clone()],
                    referenced_schema: parent_location.schema,
                    referenced_table: parent_location.name,
                    referenced_columns: vec!["Id".into()],
                    cascade: true,
                },
            );
        }

        for column in table.data_columns() {
            let column_name = dialect.identifier(&column.column_name);

            if column.is_descriptor_column() {
                let descriptor = column.column_name.strip_suffix("_Id").unwrap_or(&column.column_name);
                add_foreign_key(
                    &mut table_keys,
                    descriptor,
                    &column.column_name,
                    ForeignKey {
                        name: String::new(),
                        schema: location.schema.clone(),
                        table: location.name.clone(),
                        columns: vec![column_name],
                        referenced_schema: self.options.descriptor_schema.clone(),
                        referenced_table: "Descriptor".into(),
                        referenced_columns: vec!["Id".into()],
                        cascade: false,
                    },
                );
                continue;
            }

            let Some(target) = self.resolve_reference(column) else {
                continue;
            };
            let target_name = target.resource.resource_name.clone();
            let target_location = self.location(target, &target.table.base_name);
            add_index(&mut definition, &target_name, vec![column_name.clone()]);
            add_foreign_key(
                &mut table_keys,
                &target_name,
                &column.column_name,
                ForeignKey {
                    name: String::new(),
                    schema: location.schema.clone(),
                    table: location.name.clone(),
                    columns: vec![column_name],
                    referenced_schema: target_location.schema,
                    referenced_table: target_location.name,
                    referenced_columns: vec!["Id".into()],
                    cascade: false,
                },
            );
        }

        add_index(
            &mut definition,
            "Document",
            vec![DOCUMENT_ID_COLUMN.into(), DOCUMENT_PARTITION_KEY_COLUMN.into()],
        );
        add_foreign_key(
            &mut table_keys,
            "Document",
            DOCUMENT_ID_COLUMN,
            ForeignKey {
                name: String::new(),
                schema: location.schema.clone(),
                table: location.name.clone(),
                columns: vec![DOCUMENT_ID_COLUMN.into(), DOCUMENT_PARTITION_KEY_COLUMN.into()],
                referenced_schema: self.options.default_schema.clone(),
                referenced_table: "Document".into(),
                referenced_columns: vec!["Id".into(), "DocumentPartitionKey".into()],
                // Children reach Document through their root; a second cascade path is rejected by SQL Server
                cascade: parent.is_none(),
            },
        );

        tables.push(definition);
        foreign_keys.extend(table_keys);

        for child in &table.child_tables {
            self.emit_table(resource, child, Some(table), tables, foreign_keys);
        }
    }
}

fn not_null(name: &str, sql_type: &str) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_string(),
        sql_type: sql_type.to_string(),
        nullable: false,
        default: None,
    }
}

/// `SchoolReference` or `$.schoolReference` names the `School` resource
fn reference_target(path: &str) -> Option<String> {
    let segment = path.rsplit('.').next().unwrap_or(path);
    let segment = segment.trim_end_matches("[*]");
    let name = segment.strip_suffix("Reference").unwrap_or(segment);

    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
