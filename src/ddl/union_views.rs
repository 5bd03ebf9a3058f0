//! Union views over polymorphic resources.
//!
//! Abstract resources declared in `abstractResources` get one SELECT per
//! subclass table. Tables that carry a polymorphic reference plus a
//! discriminator get a view over their discriminated child tables.

use crate::ddl::generator::{
    DdlGenerator, ResolvedResource, AUDIT_COLUMNS, DOCUMENT_ID_COLUMN, DOCUMENT_PARTITION_KEY_COLUMN,
};
use crate::schema::{ColumnMetadata, TableMetadata};

/// Document columns, then the audit columns when tables carry them
fn trailing_columns(generator: &DdlGenerator<'_>, qualifier: &str) -> Vec<String> {
    let dialect = generator.dialect();
    let mut columns = vec![DOCUMENT_ID_COLUMN, DOCUMENT_PARTITION_KEY_COLUMN];
    if generator.options().include_audit_columns {
        columns.extend(AUDIT_COLUMNS);
    }
    columns
        .into_iter()
        .map(|c| format!("{}{}", qualifier, dialect.quote(c)))
        .collect()
}

pub(crate) fn union_views(generator: &DdlGenerator<'_>) -> Vec<String> {
    let mut statements = abstract_resource_views(generator);

    for resource in generator.resources() {
        collect_polymorphic_views(generator, resource, resource.table, &mut statements);
    }
    statements
}

/// Column exposed as `<Abstract>Id`: the flagged one, else the first natural key
fn superclass_identity_column(table: &TableMetadata) -> Option<&ColumnMetadata> {
    table
        .data_columns()
        .find(|c| c.is_superclass_identity)
        .or_else(|| table.natural_key_columns().next())
}

fn abstract_resource_views(generator: &DdlGenerator<'_>) -> Vec<String> {
    let dialect = generator.dialect();
    let mut statements = Vec::new();

    for (abstract_name, abstract_resource) in &generator.project().abstract_resources {
        let Some(metadata) = &abstract_resource.flattening_metadata else {
            continue;
        };

        let subclasses: Vec<(&ResolvedResource<'_>, &ColumnMetadata)> = metadata
            .subclass_types
            .iter()
            .filter_map(|name| match generator.resource(name) {
                Some(subclass) => match superclass_identity_column(subclass.table) {
                    Some(identity) => Some((subclass, identity)),
                    None => {
                        tracing::warn!("Subclass {} of {} has no identity column", name, abstract_name);
                        None
                    }
                },
                None => {
                    tracing::debug!("Subclass {} of {} has no table", name, abstract_name);
                    None
                }
            })
            .collect();

        let Some((first, _)) = subclasses.first() else {
            continue;
        };

        let identity_alias = format!("{}Id", abstract_name);
        let common: Vec<&str> = first
            .table
            .data_columns()
            .map(|c| c.column_name.as_str())
            .filter(|name| *name != identity_alias)
            .filter(|name| {
                subclasses.iter().all(|(subclass, identity)| {
                    identity.column_name != *name && subclass.table.column(name).is_some_and(|c| !c.is_parent_reference)
                })
            })
            .collect();

        let selects: Vec<String> = subclasses
            .iter()
            .map(|(subclass, identity)| {
                let location = generator.location(subclass, &subclass.table.base_name);
                let identity_column = dialect.identifier(&identity.column_name);
                let identity_item = if identity_column == identity_alias {
                    dialect.quote(&identity_column)
                } else {
                    format!("{} AS {}", dialect.quote(&identity_column), dialect.quote(&identity_alias))
                };

                let mut items = vec![dialect.quote("Id"), identity_item];
                items.extend(common.iter().map(|c| dialect.quote(&dialect.identifier(c))));
                items.push(format!("{} AS {}", dialect.literal(discriminator(subclass)), dialect.quote("Discriminator")));
                items.extend(trailing_columns(generator, ""));

                format!(
                    "SELECT {} FROM {}",
                    items.join(", "),
                    dialect.qualified(&location.schema, &location.name)
                )
            })
            .collect();

        let view_name = if metadata.union_view_name.is_empty() {
            abstract_name.as_str()
        } else {
            metadata.union_view_name.as_str()
        };
        let location = generator.location(first, view_name);
        statements.push(dialect.create_view(&location.schema, &location.name, &dialect.union_all(&selects)));
    }

    statements
}

fn discriminator<'r>(subclass: &'r ResolvedResource<'_>) -> &'r str {
    subclass
        .table
        .discriminator_value
        .as_deref()
        .unwrap_or(&subclass.resource.resource_name)
}

fn collect_polymorphic_views(
    generator: &DdlGenerator<'_>,
    resource: &ResolvedResource<'_>,
    table: &TableMetadata,
    statements: &mut Vec<String>,
) {
    if let Some(statement) = polymorphic_view(generator, resource, table) {
        statements.push(statement);
    }
    for child in &table.child_tables {
        collect_polymorphic_views(generator, resource, child, statements);
    }
}

/// `<Base>_Union` over the discriminated children of `table`. Each row carries
/// the child's own columns plus the parent's natural keys.
fn polymorphic_view(generator: &DdlGenerator<'_>, resource: &ResolvedResource<'_>, table: &TableMetadata) -> Option<String> {
    let has_polymorphic_reference = table.columns.iter().any(|c| c.is_polymorphic_reference);
    let has_discriminator = table.columns.iter().any(|c| c.is_discriminator);
    if !has_polymorphic_reference || !has_discriminator {
        return None;
    }

    let children: Vec<(&TableMetadata, &str)> = table
        .child_tables
        .iter()
        .filter_map(|c| c.discriminator_value.as_deref().map(|d| (c, d)))
        .collect();
    if children.is_empty() {
        return None;
    }

    let dialect = generator.dialect();
    let parent_location = generator.location(resource, &table.base_name);
    let parent_column = dialect.quote(&dialect.identifier(&format!("{}_Id", table.base_name)));
    let natural_key_names: Vec<String> = table
        .natural_key_columns()
        .map(|c| dialect.identifier(&c.column_name))
        .collect();
    let natural_keys: Vec<String> = natural_key_names
        .iter()
        .map(|c| format!("p.{}", dialect.quote(c)))
        .collect();

    let selects: Vec<String> = children
        .iter()
        .map(|(child, discriminator)| {
            let child_location = generator.location(resource, &child.base_name);
            let mut items = vec![format!("c.{}", dialect.quote("Id")), format!("c.{}", parent_column)];
            // Parent keys take precedence over a child column of the same name
            items.extend(
                child
                    .data_columns()
                    .map(|c| dialect.identifier(&c.column_name))
                    .filter(|c| !natural_key_names.contains(c))
                    .map(|c| format!("c.{}", dialect.quote(&c))),
            );
            items.extend(natural_keys.iter().cloned());
            items.push(format!("{} AS {}", dialect.literal(discriminator), dialect.quote("Discriminator")));
            items.extend(trailing_columns(generator, "c."));

            format!(
                "SELECT {} FROM {} c INNER JOIN {} p ON c.{} = p.{}",
                items.join(", "),
                dialect.qualified(&child_location.schema, &child_location.name),
                dialect.qualified(&parent_location.schema, &parent_location.name),
                parent_column,
                dialect.quote("Id")
            )
        })
        .collect();

    let location = generator.location(resource, &format!("{}_Union", table.base_name));
    Some(dialect.create_view(&location.schema, &location.name, &dialect.union_all(&selects)))
}
