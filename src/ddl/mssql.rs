use crate::ddl::dialect::{decimal_type, ForeignKey, Index, SqlDialect, TableDefinition};
use crate::schema::ColumnMetadata;

pub const MSSQL_MAX_IDENTIFIER_LENGTH: usize = 128;

/// Longest bounded NVARCHAR; anything beyond becomes NVARCHAR(MAX)
const MAX_NVARCHAR_LENGTH: u32 = 4000;

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl SqlDialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn file_name(&self) -> &'static str {
        "EdFi-DMS-Database-Schema-SQLServer.sql"
    }

    fn max_identifier_length(&self) -> usize {
        MSSQL_MAX_IDENTIFIER_LENGTH
    }

    fn quote(&self, identifier: &str) -> String {
        format!("[{}]", identifier.replace(']', "]]"))
    }

    fn map_column_type(&self, column: &ColumnMetadata) -> String {
        match column.column_type.to_ascii_lowercase().as_str() {
            "int64" | "bigint" => "BIGINT".into(),
            "int32" | "integer" | "int" => "INT".into(),
            "int16" | "short" => "SMALLINT".into(),
            "string" => match column.max_length {
                Some(length) if length > 0 && length <= MAX_NVARCHAR_LENGTH => format!("NVARCHAR({})", length),
                _ => "NVARCHAR(MAX)".into(),
            },
            "boolean" | "bool" => "BIT".into(),
            "date" => "DATE".into(),
            "datetime" => "DATETIME2(7)".into(),
            "time" => "TIME".into(),
            "decimal" => decimal_type(column),
            "currency" => "MONEY".into(),
            "percent" => "DECIMAL(5, 4)".into(),
            "year" => "SMALLINT".into(),
            "duration" => "NVARCHAR(30)".into(),
            "descriptor" => "BIGINT".into(),
            "guid" | "uuid" => "UNIQUEIDENTIFIER".into(),
            _ => "NVARCHAR(MAX)".into(),
        }
    }

    fn surrogate_key(&self) -> String {
        "[Id] BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY".into()
    }

    fn timestamp_type(&self) -> &'static str {
        "DATETIME2(7)"
    }

    fn current_timestamp(&self) -> &'static str {
        "(SYSUTCDATETIME())"
    }

    fn create_schema(&self, schema: &str) -> String {
        format!(
            "IF NOT EXISTS (SELECT * FROM sys.schemas WHERE name = '{schema}')\n\
             BEGIN\n    EXEC('CREATE SCHEMA [{schema}]');\nEND\nGO\n"
        )
    }

    fn create_table(&self, table: &TableDefinition, body: &str) -> String {
        let qualified = self.qualified(&table.schema, &table.name);
        format!(
            "IF OBJECT_ID(N'{qualified}', N'U') IS NULL\nBEGIN\n    CREATE TABLE {qualified} (\n{body}\n    );\nEND\nGO\n"
        )
    }

    fn create_index(&self, table: &TableDefinition, index: &Index) -> String {
        let qualified = self.qualified(&table.schema, &table.name);
        format!(
            "IF NOT EXISTS (SELECT * FROM sys.indexes WHERE name = N'{}' AND object_id = OBJECT_ID(N'{}'))\n    \
             CREATE INDEX {} ON {} ({});\nGO\n",
            index.name,
            qualified,
            self.quote(&index.name),
            qualified,
            self.quote_list(&index.columns)
        )
    }

    fn add_foreign_key(&self, foreign_key: &ForeignKey) -> String {
        format!(
            "IF NOT EXISTS (SELECT * FROM sys.foreign_keys WHERE name = N'{}')\n    \
             ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}){};\nGO\n",
            foreign_key.name,
            self.qualified(&foreign_key.schema, &foreign_key.table),
            self.quote(&foreign_key.name),
            self.quote_list(&foreign_key.columns),
            self.qualified(&foreign_key.referenced_schema, &foreign_key.referenced_table),
            self.quote_list(&foreign_key.referenced_columns),
            if foreign_key.cascade { " ON DELETE CASCADE" } else { "" }
        )
    }

    fn create_view(&self, schema: &str, view: &str, select: &str) -> String {
        format!("CREATE OR ALTER VIEW {} AS\n{};\nGO\n", self.qualified(schema, view), select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::dialect::ColumnDefinition;

    fn column(column_type: &str, max_length: Option<u32>) -> ColumnMetadata {
        ColumnMetadata {
            max_length,
            ..ColumnMetadata::new("C", column_type)
        }
    }

    #[test]
    fn test_type_mapping() {
        let dialect = MssqlDialect;
        assert_eq!(dialect.map_column_type(&column("int64", None)), "BIGINT");
        assert_eq!(dialect.map_column_type(&column("Integer", None)), "INT");
        assert_eq!(dialect.map_column_type(&column("string", Some(60))), "NVARCHAR(60)");
        assert_eq!(dialect.map_column_type(&column("string", Some(5000))), "NVARCHAR(MAX)");
        assert_eq!(dialect.map_column_type(&column("string", None)), "NVARCHAR(MAX)");
        assert_eq!(dialect.map_column_type(&column("datetime", None)), "DATETIME2(7)");
        assert_eq!(dialect.map_column_type(&column("currency", None)), "MONEY");
        assert_eq!(dialect.map_column_type(&column("percent", None)), "DECIMAL(5, 4)");
        assert_eq!(dialect.map_column_type(&column("guid", None)), "UNIQUEIDENTIFIER");
        assert_eq!(dialect.map_column_type(&column("mystery", None)), "NVARCHAR(MAX)");
    }

    #[test]
    fn test_create_table_is_guarded() {
        let dialect = MssqlDialect;
        let table = TableDefinition {
            schema: "dms".into(),
            name: "edfi_School".into(),
            columns: vec![ColumnDefinition {
                name: "SchoolId".into(),
                sql_type: "BIGINT".into(),
                nullable: false,
                default: None,
            }],
            ..Default::default()
        };

        let sql = dialect.create_table(&table, &dialect.table_body(&table));
        assert!(sql.starts_with("IF OBJECT_ID(N'[dms].[edfi_School]', N'U') IS NULL"));
        assert!(sql.contains("[Id] BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY"));
        assert!(sql.contains("[SchoolId] BIGINT NOT NULL"));
        assert!(sql.trim_end().ends_with("GO"));
    }

    #[test]
    fn test_foreign_key_is_guarded() {
        let sql = MssqlDialect.add_foreign_key(&ForeignKey {
            name: "FK_ClassPeriod_School".into(),
            schema: "dms".into(),
            table: "edfi_ClassPeriod".into(),
            columns: vec!["School_Id".into()],
            referenced_schema: "dms".into(),
            referenced_table: "edfi_School".into(),
            referenced_columns: vec!["Id".into()],
            cascade: false,
        });

        assert!(sql.contains("sys.foreign_keys WHERE name = N'FK_ClassPeriod_School'"));
        assert!(sql.contains("REFERENCES [dms].[edfi_School]([Id]);"));
        assert!(!sql.contains("CASCADE"));
    }
}
