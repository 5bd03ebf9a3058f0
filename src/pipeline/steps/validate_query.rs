//! GET query validation: paging parameters plus typed resource query fields.
//! Every parameter is checked; failures are reported together.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::pipeline::responses::{bad_request_failure, BAD_REQUEST_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::ResourceSchema;
use crate::types::{LogicalType, PaginationParameters, QueryElement, ValidationFailures};
use crate::validation::formats;

const RESERVED_PARAMETERS: [&str; 3] = ["offset", "limit", "totalCount"];

#[derive(Debug, Default)]
pub struct QueryValidation {
    pub pagination: PaginationParameters,
    pub query_elements: Vec<QueryElement>,
    pub errors: Vec<String>,
    pub failures: ValidationFailures,
}

impl QueryValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.failures.is_empty()
    }
}

fn parse_non_negative(value: &str) -> Option<u64> {
    value.trim().parse::<i64>().ok().filter(|n| *n >= 0).map(|n| n as u64)
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Checks a raw value against its logical type, returning the normalized value
fn normalize(value: &str, logical_type: LogicalType) -> Option<String> {
    match logical_type {
        LogicalType::Boolean => parse_bool(value).map(|b| b.to_string()),
        LogicalType::Date => formats::parse_lenient_date(value).map(|d| d.format("%Y-%m-%d").to_string()),
        LogicalType::DateTime => match formats::parse_iso_date(value) {
            Some(date) => Some(format!("{}T00:00:00Z", date.format("%Y-%m-%d"))),
            None => formats::parse_date_time(value).map(|_| value.to_string()),
        },
        LogicalType::Number => value.trim().parse::<f64>().ok().filter(|n| n.is_finite()).map(|_| value.to_string()),
        LogicalType::Time => formats::parse_time(value).map(|_| value.to_string()),
        LogicalType::String => Some(value.to_string()),
    }
}

pub fn validate_query(
    resource: &ResourceSchema,
    parameters: &BTreeMap<String, String>,
    max_page_size: u64,
) -> QueryValidation {
    let mut result = QueryValidation::default();

    if let Some(raw) = parameters.get("offset") {
        match parse_non_negative(raw) {
            Some(offset) => result.pagination.offset = Some(offset),
            None => result
                .errors
                .push("Offset must be a numeric value greater than or equal to 0.".to_string()),
        }
    }

    if let Some(raw) = parameters.get("limit") {
        match parse_non_negative(raw) {
            Some(limit) if limit <= max_page_size => result.pagination.limit = Some(limit),
            Some(_) => result.errors.push(format!(
                "Limit must be omitted or set to a numeric value between 0 and {}.",
                max_page_size
            )),
            None => result
                .errors
                .push("Limit must be a numeric value greater than or equal to 0.".to_string()),
        }
    }

    if let Some(raw) = parameters.get("totalCount") {
        match parse_bool(raw) {
            Some(total_count) => result.pagination.total_count = total_count,
            None => result.errors.push("TotalCount must be a boolean value.".to_string()),
        }
    }

    for (key, value) in parameters {
        if RESERVED_PARAMETERS.contains(&key.as_str()) {
            continue;
        }

        let Some(paths) = resource
            .query_field_mapping
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, paths)| paths)
        else {
            result
                .errors
                .push(format!("The query field '{}' is not valid for this resource.", key));
            continue;
        };
        let Some(first) = paths.first() else {
            continue;
        };

        let logical_type = first.logical_type();
        match normalize(value, logical_type) {
            Some(normalized) => result.query_elements.push(QueryElement {
                query_field_name: key.clone(),
                document_paths: paths.iter().map(|p| p.path.clone()).collect(),
                value: normalized,
                logical_type,
            }),
            None => result
                .failures
                .add(first.path.clone(), format!("The value '{}' is not valid for {}.", value, key)),
        }
    }

    result
}

pub struct ValidateQueryStep {
    max_page_size: u64,
}

impl ValidateQueryStep {
    pub fn new(max_page_size: u64) -> Self {
        Self { max_page_size }
    }
}

#[async_trait]
impl PipelineStep for ValidateQueryStep {
    fn name(&self) -> &'static str {
        "ValidateQuery"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        // GET by id ignores query parameters
        if ctx.document_uuid().is_some() {
            return Ok(());
        }
        let Some(resource) = ctx.resource_schema.clone() else {
            return Ok(());
        };

        let validation = validate_query(&resource, &ctx.frontend_request.query_parameters, self.max_page_size);
        if validation.is_valid() {
            ctx.pagination = validation.pagination;
            ctx.query_elements = validation.query_elements;
        } else {
            tracing::debug!("Query parameter validation failed - {}", ctx.trace_id());
            let response = bad_request_failure(
                BAD_REQUEST_DETAIL,
                ctx.trace_id(),
                &validation.failures,
                &validation.errors,
            );
            ctx.respond(response);
        }
        Ok(())
    }
}
