use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use edfi_dms_rust::ddl::{self, DdlError, DdlOptions, DialectKind};
use edfi_dms_rust::schema::{ApiSchemaDocument, SAMPLE_API_SCHEMA};

fn output_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("dms-ddl-{}-{}", name, std::process::id()))
}

fn sample() -> Result<ApiSchemaDocument> {
    Ok(serde_json::from_str(SAMPLE_API_SCHEMA)?)
}

#[test]
fn writes_sqlserver_script() -> Result<()> {
    let dir = output_dir("mssql");
    let dialect = DialectKind::Mssql.dialect();

    let path = ddl::write_ddl(&sample()?, dialect.as_ref(), &DdlOptions::default(), &dir)?;
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("EdFi-DMS-Database-Schema-SQLServer.sql"));

    let sql = fs::read_to_string(&path)?;
    assert!(sql.contains("IF OBJECT_ID(N'[dms].[edfi_School]', N'U') IS NULL"));
    assert!(sql.contains("[Id] BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY"));
    assert!(sql.contains("[CreateDate] DATETIME2(7) NOT NULL DEFAULT (SYSUTCDATETIME())"));
    assert!(sql.contains("ADD CONSTRAINT [FK_ClassPeriod_School] FOREIGN KEY ([School_Id]) REFERENCES [dms].[edfi_School]([Id]);"));
    assert!(sql.contains("CREATE OR ALTER VIEW [dms].[edfi_EducationOrganization] AS"));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn writes_postgresql_script() -> Result<()> {
    let dir = output_dir("pgsql");
    let dialect = DialectKind::Pgsql.dialect();

    let path = ddl::write_ddl(&sample()?, dialect.as_ref(), &DdlOptions::default(), &dir)?;
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("EdFi-DMS-Database-Schema-PostgreSQL.sql"));

    let sql = fs::read_to_string(&path)?;
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS dms.edfi_School ("));
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS dms.edfi_BellScheduleClassPeriod ("));
    assert!(sql.contains("ADD CONSTRAINT FK_BellScheduleClassPeriod_BellSchedule FOREIGN KEY (BellSchedule_Id) REFERENCES dms.edfi_BellSchedule(Id) ON DELETE CASCADE;"));
    assert!(sql.contains("ADD CONSTRAINT FK_BellScheduleClassPeriod_ClassPeriod FOREIGN KEY (ClassPeriod_Id) REFERENCES dms.edfi_ClassPeriod(Id);"));
    assert!(sql.contains("ADD CONSTRAINT FK_StudentAssessment_Student FOREIGN KEY (Student_Id) REFERENCES dms.edfi_Student(Id);"));
    assert!(!sql.contains("REFERENCES dms.edfi_EducationOrganization"));
    assert!(sql.contains("CREATE OR REPLACE VIEW dms.edfi_BellScheduleClassPeriod_View AS"));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn separate_schemas_are_created_once() -> Result<()> {
    let options = DdlOptions {
        use_prefixed_table_names: false,
        descriptor_schema: "descriptors".into(),
        ..Default::default()
    };
    let dialect = DialectKind::Pgsql.dialect();
    let sql = ddl::generate_ddl_string(&sample()?, dialect.as_ref(), &options)?;

    assert_eq!(sql.matches("CREATE SCHEMA IF NOT EXISTS edfi;").count(), 1);
    assert_eq!(sql.matches("CREATE SCHEMA IF NOT EXISTS descriptors;").count(), 1);
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS edfi.School ("));
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS descriptors.GradeLevelDescriptor ("));
    assert!(sql.contains("REFERENCES descriptors.Descriptor(Id);"));
    Ok(())
}

#[test]
fn missing_project_schema_writes_nothing() -> Result<()> {
    let dir = output_dir("invalid");
    let document: ApiSchemaDocument = serde_json::from_value(json!({"projectSchema": null}))?;
    let dialect = DialectKind::Mssql.dialect();

    let error = ddl::write_ddl(&document, dialect.as_ref(), &DdlOptions::default(), &dir).unwrap_err();
    assert!(matches!(error, DdlError::InvalidProjectSchema));
    assert_eq!(error.to_string(), "ApiSchema does not contain valid projectSchema.");
    assert!(!dir.join(dialect.file_name()).exists());
    Ok(())
}

#[test]
fn long_identifiers_are_shortened_for_postgresql() -> Result<()> {
    let long_name = format!("StudentSchoolAssociation{}", "AlternativeGraduationPlan".repeat(3));
    let schema = json!({
        "projectSchema": {
            "projectName": "TestProject",
            "resourceSchemas": {
                "things": {
                    "resourceName": long_name,
                    "flatteningMetadata": {
                        "table": {
                            "baseName": long_name,
                            "columns": [{"columnName": "Name", "columnType": "string", "maxLength": 20, "isNaturalKey": true}]
                        }
                    }
                }
            }
        }
    });

    let mut options = DdlOptions::default();
    options.schema_mapping.insert("TestProject".into(), "dms".into());
    let dialect = DialectKind::Pgsql.dialect();
    let first = ddl::generate_ddl_from_value(schema.clone(), dialect.as_ref(), &options)?;
    let second = ddl::generate_ddl_from_value(schema, dialect.as_ref(), &options)?;

    assert_eq!(first, second);
    assert!(!first.contains(&long_name));
    let shortened = ddl::naming::make_identifier(&long_name, 63);
    assert!(first.contains(&format!("CREATE TABLE IF NOT EXISTS dms.{} (", shortened)));
    Ok(())
}

fn polymorphic_contact() -> serde_json::Value {
    json!({
        "projectSchema": {
            "projectName": "Sample",
            "resourceSchemas": {
                "contacts": {
                    "resourceName": "Contact",
                    "flatteningMetadata": {
                        "table": {
                            "baseName": "Contact",
                            "columns": [
                                {"columnName": "ContactUniqueId", "columnType": "string", "maxLength": 32, "isNaturalKey": true, "isRequired": true},
                                {"columnName": "Owner_Id", "columnType": "bigint", "isPolymorphicReference": true},
                                {"columnName": "OwnerType", "columnType": "string", "maxLength": 50, "isDiscriminator": true}
                            ],
                            "childTables": [
                                {"baseName": "ContactStudentOwner", "discriminatorValue": "Student", "columns": [
                                    {"columnName": "StudentUniqueId", "columnType": "string", "maxLength": 32, "isRequired": true}
                                ]}
                            ]
                        }
                    }
                }
            }
        }
    })
}

#[test]
fn union_views_carry_document_and_audit_columns() -> Result<()> {
    let mssql = DialectKind::Mssql.dialect();
    let pgsql = DialectKind::Pgsql.dialect();

    let sql = ddl::generate_ddl_string(&sample()?, mssql.as_ref(), &DdlOptions::default())?;
    assert!(sql.contains(
        "SELECT [Id], [SchoolId] AS [EducationOrganizationId], [NameOfInstitution], 'School' AS [Discriminator], \
         [Document_Id], [Document_PartitionKey], [CreateDate], [LastModifiedDate], [ChangeVersion] FROM [dms].[edfi_School]"
    ));

    let sql = ddl::generate_ddl_string(&sample()?, pgsql.as_ref(), &DdlOptions::default())?;
    assert!(sql.contains(
        "'School' AS Discriminator, Document_Id, Document_PartitionKey, CreateDate, LastModifiedDate, ChangeVersion \
         FROM dms.edfi_School"
    ));

    let without_audit = DdlOptions {
        include_audit_columns: false,
        ..Default::default()
    };
    let sql = ddl::generate_ddl_string(&sample()?, pgsql.as_ref(), &without_audit)?;
    assert!(sql.contains("'School' AS Discriminator, Document_Id, Document_PartitionKey FROM dms.edfi_School"));
    assert!(!sql.contains("ChangeVersion"));
    Ok(())
}

#[test]
fn polymorphic_union_view_projects_child_columns() -> Result<()> {
    let mssql = DialectKind::Mssql.dialect();
    let pgsql = DialectKind::Pgsql.dialect();

    let sql = ddl::generate_ddl_from_value(polymorphic_contact(), mssql.as_ref(), &DdlOptions::default())?;
    assert!(sql.contains("CREATE OR ALTER VIEW [dms].[sample_Contact_Union] AS"));
    assert!(sql.contains(
        "SELECT c.[Id], c.[Contact_Id], c.[StudentUniqueId], p.[ContactUniqueId], 'Student' AS [Discriminator], \
         c.[Document_Id], c.[Document_PartitionKey], c.[CreateDate], c.[LastModifiedDate], c.[ChangeVersion] \
         FROM [dms].[sample_ContactStudentOwner] c INNER JOIN [dms].[sample_Contact] p ON c.[Contact_Id] = p.[Id]"
    ));

    let sql = ddl::generate_ddl_from_value(polymorphic_contact(), pgsql.as_ref(), &DdlOptions::default())?;
    assert!(sql.contains(
        "SELECT c.Id, c.Contact_Id, c.StudentUniqueId, p.ContactUniqueId, 'Student' AS Discriminator, \
         c.Document_Id, c.Document_PartitionKey, c.CreateDate, c.LastModifiedDate, c.ChangeVersion \
         FROM dms.sample_ContactStudentOwner c INNER JOIN dms.sample_Contact p ON c.Contact_Id = p.Id"
    ));
    Ok(())
}
