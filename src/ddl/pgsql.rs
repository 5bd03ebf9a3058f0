use crate::ddl::dialect::{decimal_type, ForeignKey, Index, SqlDialect, TableDefinition};
use crate::schema::ColumnMetadata;

pub const PGSQL_MAX_IDENTIFIER_LENGTH: usize = 63;

/// PostgreSQL output uses unquoted identifiers, so names fold to lower case
/// inside the catalog; existence checks compare lower-cased names.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgsqlDialect;

impl SqlDialect for PgsqlDialect {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn file_name(&self) -> &'static str {
        "EdFi-DMS-Database-Schema-PostgreSQL.sql"
    }

    fn max_identifier_length(&self) -> usize {
        PGSQL_MAX_IDENTIFIER_LENGTH
    }

    fn quote(&self, identifier: &str) -> String {
        identifier.to_string()
    }

    fn map_column_type(&self, column: &ColumnMetadata) -> String {
        match column.column_type.to_ascii_lowercase().as_str() {
            "int64" | "bigint" => "BIGINT".into(),
            "int32" | "integer" | "int" => "INTEGER".into(),
            "int16" | "short" => "SMALLINT".into(),
            "string" => match column.max_length {
                Some(length) if length > 0 => format!("VARCHAR({})", length),
                _ => "TEXT".into(),
            },
            "boolean" | "bool" => "BOOLEAN".into(),
            "date" => "DATE".into(),
            "datetime" => "TIMESTAMP".into(),
            "time" => "TIME".into(),
            "decimal" => decimal_type(column),
            "currency" => "MONEY".into(),
            "percent" => "DECIMAL(5, 4)".into(),
            "year" => "SMALLINT".into(),
            "duration" => "VARCHAR(30)".into(),
            "descriptor" => "BIGINT".into(),
            "guid" | "uuid" => "UUID".into(),
            _ => "TEXT".into(),
        }
    }

    fn surrogate_key(&self) -> String {
        "Id BIGSERIAL PRIMARY KEY".into()
    }

    fn timestamp_type(&self) -> &'static str {
        "TIMESTAMP"
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn create_schema(&self, schema: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {};\n", schema)
    }

    fn create_table(&self, table: &TableDefinition, body: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
            self.qualified(&table.schema, &table.name),
            body
        )
    }

    fn create_index(&self, table: &TableDefinition, index: &Index) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({});\n",
            index.name,
            self.qualified(&table.schema, &table.name),
            self.quote_list(&index.columns)
        )
    }

    fn add_foreign_key(&self, foreign_key: &ForeignKey) -> String {
        format!(
            "DO $$\nBEGIN\n    IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = '{}') THEN\n        \
             ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}){};\n    END IF;\nEND $$;\n",
            foreign_key.name.to_lowercase(),
            self.qualified(&foreign_key.schema, &foreign_key.table),
            foreign_key.name,
            self.quote_list(&foreign_key.columns),
            self.qualified(&foreign_key.referenced_schema, &foreign_key.referenced_table),
            self.quote_list(&foreign_key.referenced_columns),
            if foreign_key.cascade { " ON DELETE CASCADE" } else { "" }
        )
    }

    fn create_view(&self, schema: &str, view: &str, select: &str) -> String {
        format!("CREATE OR REPLACE VIEW {} AS\n{};\n", self.qualified(schema, view), select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::dialect::ColumnDefinition;

    #[test]
    fn test_type_mapping() {
        let dialect = PgsqlDialect;
        let mut name = ColumnMetadata::new("Name", "string");
        name.max_length = Some(100);

        assert_eq!(dialect.map_column_type(&name), "VARCHAR(100)");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "string")), "TEXT");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "int32")), "INTEGER");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "boolean")), "BOOLEAN");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "datetime")), "TIMESTAMP");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "uuid")), "UUID");
        assert_eq!(dialect.map_column_type(&ColumnMetadata::new("C", "")), "TEXT");
    }

    #[test]
    fn test_table_body() {
        let dialect = PgsqlDialect;
        let table = TableDefinition {
            schema: "dms".into(),
            name: "School".into(),
            columns: vec![
                ColumnDefinition {
                    name: "Name".into(),
                    sql_type: "VARCHAR(100)".into(),
                    nullable: false,
                    default: None,
                },
                ColumnDefinition {
                    name: "WebSite".into(),
                    sql_type: "TEXT".into(),
                    nullable: true,
                    default: None,
                },
            ],
            unique_constraints: vec![("UQ_School_NaturalKey".into(), vec!["Name".into()])],
            indexes: vec![],
        };

        let sql = dialect.create_table(&table, &dialect.table_body(&table));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS dms.School ("));
        assert!(sql.contains("Id BIGSERIAL PRIMARY KEY"));
        assert!(sql.contains("Name VARCHAR(100) NOT NULL"));
        assert!(sql.contains("WebSite TEXT,") || sql.contains("WebSite TEXT\n"));
        assert!(!sql.contains("WebSite TEXT NOT NULL"));
        assert!(sql.contains("CONSTRAINT UQ_School_NaturalKey UNIQUE (Name)"));
    }

    #[test]
    fn test_foreign_key_guard_uses_lower_case_name() {
        let sql = PgsqlDialect.add_foreign_key(&ForeignKey {
            name: "FK_SchoolGradeLevel_School".into(),
            schema: "dms".into(),
            table: "SchoolGradeLevel".into(),
            columns: vec!["School_Id".into()],
            referenced_schema: "dms".into(),
            referenced_table: "School".into(),
            referenced_columns: vec!["Id".into()],
            cascade: true,
        });

        assert!(sql.contains("conname = 'fk_schoolgradelevel_school'"));
        assert!(sql.contains("REFERENCES dms.School(Id) ON DELETE CASCADE;"));
    }
}
