// Body validators used by the pipeline steps

pub mod document_validator;
pub mod duplicate_properties;
pub mod equality_constraints;
pub mod formats;

pub use document_validator::{into_failures, prune_nulls, DocumentValidator, JsonSchemaDocumentValidator, ValidationError};
pub use duplicate_properties::{check_duplicate_properties, find_duplicate_paths, DuplicatePropertyStrategy};
pub use equality_constraints::validate_equality_constraints;
