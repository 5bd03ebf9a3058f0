//! Relational DDL generation from the flattening metadata of an ApiSchema.
//!
//! [`generate_ddl_string`] is a pure function of its inputs. [`write_ddl`]
//! builds the whole script before it touches the file system, so a failed run
//! never leaves a partial file behind.

pub mod dialect;
pub mod generator;
pub mod mssql;
pub mod naming;
pub mod options;
pub mod pgsql;
mod union_views;
mod views;

pub use dialect::SqlDialect;
pub use generator::DdlGenerator;
pub use mssql::MssqlDialect;
pub use options::DdlOptions;
pub use pgsql::PgsqlDialect;

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::ApiSchemaDocument;

#[derive(Debug, Error)]
pub enum DdlError {
    #[error("ApiSchema does not contain valid projectSchema.")]
    InvalidProjectSchema,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ApiSchema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid DDL options: {}", .0.join("; "))]
    InvalidOptions(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DialectKind {
    Mssql,
    Pgsql,
}

impl DialectKind {
    pub fn dialect(self) -> Box<dyn SqlDialect> {
        match self {
            DialectKind::Mssql => Box::new(MssqlDialect),
            DialectKind::Pgsql => Box::new(PgsqlDialect),
        }
    }
}

pub fn generate_ddl_string(
    document: &ApiSchemaDocument,
    dialect: &dyn SqlDialect,
    options: &DdlOptions,
) -> Result<String, DdlError> {
    options.validate().map_err(DdlError::InvalidOptions)?;

    let project = document
        .project_schema
        .as_ref()
        .filter(|p| p.resource_schemas.is_some())
        .ok_or(DdlError::InvalidProjectSchema)?;

    Ok(DdlGenerator::new(project, dialect, options).generate())
}

pub fn generate_ddl_from_value(
    value: Value,
    dialect: &dyn SqlDialect,
    options: &DdlOptions,
) -> Result<String, DdlError> {
    let document: ApiSchemaDocument = serde_json::from_value(value)?;
    generate_ddl_string(&document, dialect, options)
}

/// Writes the dialect's script into `output_dir`, creating it if needed
pub fn write_ddl(
    document: &ApiSchemaDocument,
    dialect: &dyn SqlDialect,
    options: &DdlOptions,
    output_dir: &Path,
) -> Result<PathBuf, DdlError> {
    let sql = generate_ddl_string(document, dialect, options)?;

    fs::create_dir_all(output_dir).map_err(|source| DdlError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(dialect.file_name());
    fs::write(&path, sql).map_err(|source| DdlError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Wrote {} DDL to {}", dialect.name(), path.display());
    Ok(path)
}
