//! Pipeline steps, one per file, in the order the pipelines run them.

pub mod provide_api_schema;
pub mod parse_path;
pub mod validate_endpoint;
pub mod parse_body;
pub mod request_body_logging;
pub mod duplicate_properties;
pub mod reject_resource_identifier;
pub mod coerce_date_times;
pub mod coerce_from_strings;
pub mod validate_document;
pub mod validate_decimal;
pub mod validate_matching_document_uuids;
pub mod validate_equality_constraint;
pub mod build_resource_info;
pub mod extract_document_info;
pub mod disallow_duplicate_references;
pub mod array_uniqueness;
pub mod validate_query;

pub mod upsert_handler;
pub mod get_by_id_handler;
pub mod query_handler;
pub mod update_handler;
pub mod delete_handler;

pub use array_uniqueness::ArrayUniquenessStep;
pub use build_resource_info::BuildResourceInfoStep;
pub use coerce_date_times::CoerceDateTimesStep;
pub use coerce_from_strings::CoerceFromStringsStep;
pub use delete_handler::DeleteHandlerStep;
pub use disallow_duplicate_references::DisallowDuplicateReferencesStep;
pub use duplicate_properties::DuplicatePropertiesStep;
pub use extract_document_info::ExtractDocumentInfoStep;
pub use get_by_id_handler::GetByIdHandlerStep;
pub use parse_body::ParseBodyStep;
pub use parse_path::ParsePathStep;
pub use provide_api_schema::ProvideApiSchemaStep;
pub use query_handler::QueryHandlerStep;
pub use reject_resource_identifier::RejectResourceIdentifierStep;
pub use request_body_logging::RequestBodyLoggingStep;
pub use update_handler::UpdateHandlerStep;
pub use upsert_handler::UpsertHandlerStep;
pub use validate_decimal::ValidateDecimalStep;
pub use validate_document::ValidateDocumentStep;
pub use validate_endpoint::ValidateEndpointStep;
pub use validate_equality_constraint::ValidateEqualityConstraintStep;
pub use validate_matching_document_uuids::ValidateMatchingDocumentUuidsStep;
pub use validate_query::ValidateQueryStep;
