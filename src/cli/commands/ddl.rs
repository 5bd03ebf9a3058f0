use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::ddl::{self, DdlOptions, DialectKind};
use crate::schema::ApiSchemaDocument;

#[derive(Args, Debug)]
pub struct DdlArgs {
    #[arg(long, help = "ApiSchema file (JSON or YAML)")]
    pub schema: PathBuf,

    #[arg(long, help = "Directory the script is written into")]
    pub output: PathBuf,

    #[arg(long, value_enum, help = "Target SQL dialect")]
    pub dialect: DialectKind,

    #[arg(long, help = "Emit extension tables")]
    pub include_extensions: bool,

    #[arg(long, help = "Skip union views for polymorphic resources")]
    pub skip_union_views: bool,

    #[arg(long, help = "Skip foreign key constraints")]
    pub no_foreign_keys: bool,

    #[arg(long, help = "Skip natural key unique constraints")]
    pub no_natural_key_constraints: bool,

    #[arg(long, help = "Skip natural key views")]
    pub no_natural_key_views: bool,

    #[arg(long, help = "Skip CreateDate, LastModifiedDate and ChangeVersion")]
    pub no_audit_columns: bool,

    #[arg(long, help = "Put each project in its own schema instead of prefixing table names")]
    pub no_prefixed_table_names: bool,

    #[arg(long, help = "Schema for core tables (default: dms)")]
    pub default_schema: Option<String>,

    #[arg(long, help = "Schema for descriptor tables (default: dms)")]
    pub descriptor_schema: Option<String>,

    #[arg(long = "schema-mapping", value_parser = parse_schema_mapping, help = "Project=schema, repeatable")]
    pub schema_mapping: Vec<(String, String)>,
}

impl DdlArgs {
    pub fn options(&self) -> DdlOptions {
        let mut options = DdlOptions {
            include_extensions: self.include_extensions,
            skip_union_views: self.skip_union_views,
            generate_foreign_key_constraints: !self.no_foreign_keys,
            generate_natural_key_constraints: !self.no_natural_key_constraints,
            generate_natural_key_views: !self.no_natural_key_views,
            include_audit_columns: !self.no_audit_columns,
            use_prefixed_table_names: !self.no_prefixed_table_names,
            ..Default::default()
        };
        if let Some(schema) = &self.default_schema {
            options.default_schema = schema.clone();
        }
        if let Some(schema) = &self.descriptor_schema {
            options.descriptor_schema = schema.clone();
        }
        for (project, schema) in &self.schema_mapping {
            options.set_schema(project, schema);
        }
        options
    }
}

fn parse_schema_mapping(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((project, schema)) if !project.trim().is_empty() && !schema.trim().is_empty() => {
            Ok((project.trim().to_string(), schema.trim().to_string()))
        }
        _ => Err(format!("expected Project=schema, got '{}'", raw)),
    }
}

fn load_schema_document(path: &Path) -> anyhow::Result<ApiSchemaDocument> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read schema file {}", path.display()))?;

    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML schema {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON schema {}", path.display()))?,
    };

    serde_json::from_value(value).with_context(|| format!("{} is not an ApiSchema document", path.display()))
}

pub fn handle(args: DdlArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let document = load_schema_document(&args.schema)?;
    let dialect = args.dialect.dialect();
    let options = args.options();

    let path = ddl::write_ddl(&document, dialect.as_ref(), &options, &args.output)
        .with_context(|| format!("DDL generation failed for {}", args.schema.display()))?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "success": true,
                "data": { "dialect": dialect.name(), "path": path.display().to_string() }
            })
        ),
        OutputFormat::Text => println!("Wrote {} DDL to {}", dialect.name(), path.display()),
    }
    Ok(())
}
