use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::DmsResponse;
use crate::types::{FrontendRequest, RequestMethod, TraceId};

fn request_method(method: &Method) -> Option<RequestMethod> {
    match *method {
        Method::GET => Some(RequestMethod::Get),
        Method::POST => Some(RequestMethod::Post),
        Method::PUT => Some(RequestMethod::Put),
        Method::DELETE => Some(RequestMethod::Delete),
        _ => None,
    }
}

/// Any method on `/<path_base>/*path`: hand the request to the pipeline for
/// its method and render whatever it answers
pub async fn resource_request(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    Query(query_parameters): Query<BTreeMap<String, String>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let method = request_method(&method).ok_or_else(|| ApiError::bad_request("Unsupported method"))?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large("Request body exceeds the configured size limit")
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })?;
    let body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8(body.to_vec()).map_err(|_| ApiError::bad_request("Request body must be UTF-8"))?)
    };

    let mut request = FrontendRequest::new(method, format!("/{}", path.trim_start_matches('/')))
        .with_trace_id(TraceId::generate());
    request.body = body;
    request.query_parameters = query_parameters;

    let response = state.service.handle(request).await;
    Ok(DmsResponse::new(response, &*state.path_base))
}
