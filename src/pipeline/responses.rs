// Failure body builders shared by every pipeline step

use serde_json::{json, Value};

use crate::types::{FrontendResponse, TraceId, ValidationFailures};

pub const DATA_VALIDATION_TYPE: &str = "urn:ed-fi:api:bad-request:data:validation";
pub const BAD_REQUEST_TYPE: &str = "urn:ed-fi:api:bad-request";
pub const NOT_FOUND_TYPE: &str = "urn:ed-fi:api:not-found";

pub const DATA_VALIDATION_DETAIL: &str = "Data validation failed. See 'validationErrors' for details.";
pub const BAD_REQUEST_DETAIL: &str = "The request could not be processed. See 'errors' for details.";
pub const NOT_FOUND_DETAIL: &str = "The specified data could not be found.";

fn failure_body(
    problem_type: &str,
    title: &str,
    status: u16,
    detail: &str,
    trace_id: &TraceId,
    failures: &ValidationFailures,
    errors: &[String],
) -> Value {
    json!({
        "detail": detail,
        "type": problem_type,
        "title": title,
        "status": status,
        "correlationId": trace_id.0,
        "validationErrors": failures.to_value(),
        "errors": errors,
    })
}

/// 400 for body content that broke a data rule
pub fn data_validation_failure(
    detail: &str,
    trace_id: &TraceId,
    failures: &ValidationFailures,
    errors: &[String],
) -> FrontendResponse {
    FrontendResponse::new(
        400,
        Some(failure_body(
            DATA_VALIDATION_TYPE,
            "Data Validation Failed",
            400,
            detail,
            trace_id,
            failures,
            errors,
        )),
    )
}

/// 400 for a request whose shape is wrong rather than its data
pub fn bad_request_failure(
    detail: &str,
    trace_id: &TraceId,
    failures: &ValidationFailures,
    errors: &[String],
) -> FrontendResponse {
    FrontendResponse::new(
        400,
        Some(failure_body(
            BAD_REQUEST_TYPE,
            "Bad Request",
            400,
            detail,
            trace_id,
            failures,
            errors,
        )),
    )
}

pub fn not_found_failure(trace_id: &TraceId, errors: &[String]) -> FrontendResponse {
    FrontendResponse::new(
        404,
        Some(failure_body(
            NOT_FOUND_TYPE,
            "Not Found",
            404,
            NOT_FOUND_DETAIL,
            trace_id,
            &ValidationFailures::new(),
            errors,
        )),
    )
}

pub fn internal_failure(message: &str, trace_id: &TraceId) -> FrontendResponse {
    FrontendResponse::new(
        500,
        Some(json!({
            "error": message,
            "correlationId": trace_id.0,
        })),
    )
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
