//! Natural-key views: every table gets `<Table>_View`, which swaps surrogate
//! foreign keys for the natural keys they stand for.

use std::collections::HashSet;

use crate::ddl::generator::{DdlGenerator, ResolvedResource};
use crate::ddl::naming::view_alias;
use crate::schema::TableMetadata;

const BASE_ALIAS: &str = "t0";

pub(crate) fn natural_key_views(generator: &DdlGenerator<'_>) -> Vec<String> {
    let mut statements = Vec::new();
    for resource in generator.resources() {
        let mut ancestors = Vec::new();
        collect_views(generator, resource, resource.table, &mut ancestors, &mut statements);
    }
    statements
}

fn collect_views<'t>(
    generator: &DdlGenerator<'_>,
    resource: &ResolvedResource<'_>,
    table: &'t TableMetadata,
    ancestors: &mut Vec<&'t TableMetadata>,
    statements: &mut Vec<String>,
) {
    statements.push(view_statement(generator, resource, table, ancestors));

    ancestors.push(table);
    for child in &table.child_tables {
        collect_views(generator, resource, child, ancestors, statements);
    }
    ancestors.pop();
}

fn view_statement(
    generator: &DdlGenerator<'_>,
    resource: &ResolvedResource<'_>,
    table: &TableMetadata,
    ancestors: &[&TableMetadata],
) -> String {
    let dialect = generator.dialect();
    let location = generator.location(resource, &table.base_name);
    let view_name = dialect.identifier(&format!("{}_View", location.name));

    let mut builder = ViewBuilder::new(generator, view_name.clone());
    builder.select(BASE_ALIAS, "Id", "Id");

    // Join up the parent chain first, nearest parent first
    let mut chain = Vec::new();
    let mut child_alias = BASE_ALIAS.to_string();
    for parent in ancestors.iter().rev() {
        let parent_location = generator.location(resource, &parent.base_name);
        let alias = builder.next_alias("p");
        builder.joins.push(format!(
            "INNER JOIN {} {} ON {}.{} = {}.Id",
            dialect.qualified(&parent_location.schema, &parent_location.name),
            alias,
            child_alias,
            dialect.quote(&dialect.identifier(&format!("{}_Id", parent.base_name))),
            alias
        ));
        chain.push((alias.clone(), *parent));
        child_alias = alias;
    }

    let mut visited = vec![resource.resource.resource_name.clone()];
    for (alias, parent) in chain.iter().rev() {
        builder.expand(alias, parent, &mut visited);
    }
    builder.expand(BASE_ALIAS, table, &mut visited);

    let mut select = format!(
        "SELECT\n    {}\nFROM {} {}",
        builder.items.join(",\n    "),
        dialect.qualified(&location.schema, &location.name),
        BASE_ALIAS
    );
    for join in &builder.joins {
        select.push('\n');
        select.push_str(join);
    }

    dialect.create_view(&location.schema, &view_name, &select)
}

struct ViewBuilder<'g, 'a> {
    generator: &'g DdlGenerator<'a>,
    view_name: String,
    items: Vec<String>,
    aliases: HashSet<String>,
    joins: Vec<String>,
    alias_counter: usize,
}

impl<'g, 'a> ViewBuilder<'g, 'a> {
    fn new(generator: &'g DdlGenerator<'a>, view_name: String) -> Self {
        Self {
            generator,
            view_name,
            items: Vec::new(),
            aliases: HashSet::new(),
            joins: Vec::new(),
            alias_counter: 0,
        }
    }

    fn next_alias(&mut self, prefix: &str) -> String {
        self.alias_counter += 1;
        format!("{}{}", prefix, self.alias_counter)
    }

    /// First alias wins; a later column with the same alias is dropped
    fn select(&mut self, table_alias: &str, column: &str, alias: &str) {
        if !self.aliases.insert(alias.to_string()) {
            tracing::warn!(
                "View {}: alias {} already selected, skipping {}.{}",
                self.view_name,
                alias,
                table_alias,
                column
            );
            return;
        }

        let dialect = self.generator.dialect();
        let column_ref = format!("{}.{}", table_alias, dialect.quote(column));
        if column == alias {
            self.items.push(column_ref);
        } else {
            self.items.push(format!("{} AS {}", column_ref, dialect.quote(alias)));
        }
    }

    /// Selects the natural keys of `table`, following references to other
    /// resources. `visited` holds the resources on the current join path.
    fn expand(&mut self, table_alias: &str, table: &TableMetadata, visited: &mut Vec<String>) {
        let generator = self.generator;
        let dialect = generator.dialect();

        for column in table.natural_key_columns() {
            let column_name = dialect.identifier(&column.column_name);
            let target = generator
                .resolve_reference(column)
                .filter(|t| !visited.contains(&t.resource.resource_name));

            match target {
                Some(target) => {
                    let target_location = generator.location(target, &target.table.base_name);
                    let alias = self.next_alias("r");
                    self.joins.push(format!(
                        "LEFT JOIN {} {} ON {}.{} = {}.Id",
                        dialect.qualified(&target_location.schema, &target_location.name),
                        alias,
                        table_alias,
                        dialect.quote(&column_name),
                        alias
                    ));

                    visited.push(target.resource.resource_name.clone());
                    self.expand(&alias, target.table, visited);
                    visited.pop();
                }
                None => {
                    let alias = view_alias(&column_name);
                    self.select(table_alias, &column_name, &alias);
                }
            }
        }
    }
}
