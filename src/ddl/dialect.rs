//! Dialect strategy: everything that differs between SQL Server and
//! PostgreSQL output goes through [`SqlDialect`].

use crate::ddl::naming::make_identifier;
use crate::schema::ColumnMetadata;

/// A column definition line inside CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Foreign key collected during table emission and written in the second pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub schema: String,
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

/// One CREATE TABLE statement, with the indexes that follow it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDefinition {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// `(constraint name, columns)`
    pub unique_constraints: Vec<(String, Vec<String>)>,
    pub indexes: Vec<Index>,
}

pub trait SqlDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// File written into the output directory
    fn file_name(&self) -> &'static str;

    fn max_identifier_length(&self) -> usize;

    fn quote(&self, identifier: &str) -> String;

    fn map_column_type(&self, column: &ColumnMetadata) -> String;

    /// Full surrogate key column line, e.g. `Id BIGSERIAL PRIMARY KEY`
    fn surrogate_key(&self) -> String;

    fn timestamp_type(&self) -> &'static str;

    fn current_timestamp(&self) -> &'static str;

    fn create_schema(&self, schema: &str) -> String;

    /// Wraps a CREATE TABLE body in the dialect's existence guard
    fn create_table(&self, table: &TableDefinition, body: &str) -> String;

    fn create_index(&self, table: &TableDefinition, index: &Index) -> String;

    fn add_foreign_key(&self, foreign_key: &ForeignKey) -> String;

    fn create_view(&self, schema: &str, view: &str, select: &str) -> String;

    fn identifier(&self, name: &str) -> String {
        make_identifier(name, self.max_identifier_length())
    }

    fn qualified(&self, schema: &str, name: &str) -> String {
        format!("{}.{}", self.quote(schema), self.quote(name))
    }

    fn quote_list(&self, columns: &[String]) -> String {
        columns.iter().map(|c| self.quote(c)).collect::<Vec<_>>().join(", ")
    }

    fn column_definition(&self, column: &ColumnDefinition) -> String {
        let mut line = format!("{} {}", self.quote(&column.name), column.sql_type);
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            line.push_str(" DEFAULT ");
            line.push_str(default);
        }
        line
    }

    fn unique_constraint(&self, name: &str, columns: &[String]) -> String {
        format!("CONSTRAINT {} UNIQUE ({})", self.quote(name), self.quote_list(columns))
    }

    /// Lines of the CREATE TABLE body, one column or constraint each
    fn table_body(&self, table: &TableDefinition) -> String {
        let mut lines = vec![self.surrogate_key()];
        lines.extend(table.columns.iter().map(|c| self.column_definition(c)));
        lines.extend(
            table
                .unique_constraints
                .iter()
                .map(|(name, columns)| self.unique_constraint(name, columns)),
        );
        lines
            .iter()
            .map(|line| format!("    {}", line))
            .collect::<Vec<_>>()
            .join(",\n")
    }

    fn union_all(&self, selects: &[String]) -> String {
        selects.join("\nUNION ALL\n")
    }

    /// String literal for discriminator values
    fn literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// DECIMAL with whatever precision and scale the column declares
pub(crate) fn decimal_type(column: &ColumnMetadata) -> String {
    match (column.precision, column.scale) {
        (Some(precision), Some(scale)) => format!("DECIMAL({}, {})", precision, scale),
        (Some(precision), None) => format!("DECIMAL({}, 0)", precision),
        (None, Some(scale)) => format!("DECIMAL({}, {})", scale + 10, scale),
        (None, None) => "DECIMAL".to_string(),
    }
}
