use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::types::FrontendResponse;

/// Renders a pipeline response as HTTP. The Location path is relative to the
/// data root, so it is prefixed with the configured path base here.
#[derive(Debug)]
pub struct DmsResponse {
    pub response: FrontendResponse,
    pub path_base: String,
}

impl DmsResponse {
    pub fn new(response: FrontendResponse, path_base: impl Into<String>) -> Self {
        Self {
            response,
            path_base: path_base.into(),
        }
    }

    pub fn location(&self) -> Option<String> {
        self.response
            .location_header_path
            .as_ref()
            .map(|path| format!("/{}{}", self.path_base.trim_matches('/'), path))
    }
}

impl IntoResponse for DmsResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let location = self.location();

        let mut response = match &self.response.body {
            Some(body) => match serde_json::to_vec(body) {
                Ok(bytes) => {
                    let mut response = Response::new(Body::from(bytes));
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    response
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response body: {}", e);
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            },
            None => Response::new(Body::empty()),
        };
        *response.status_mut() = status;

        let headers = response.headers_mut();
        if let Some(location) = location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    headers.insert(header::LOCATION, value);
                }
                Err(_) => tracing::warn!("Dropping unencodable Location header: {}", location),
            }
        }
        for (name, value) in &self.response.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Dropping unencodable response header: {}", name),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_is_prefixed_with_path_base() {
        let response = FrontendResponse::new(201, None).with_location("/ed-fi/schools/abc");
        let rendered = DmsResponse::new(response, "data").into_response();

        assert_eq!(rendered.status(), StatusCode::CREATED);
        assert_eq!(
            rendered.headers().get(header::LOCATION).unwrap(),
            "/data/ed-fi/schools/abc"
        );
    }

    #[test]
    fn test_body_and_custom_headers() {
        let response = FrontendResponse::new(200, Some(json!([]))).with_header("Total-Count", "3");
        let rendered = DmsResponse::new(response, "data").into_response();

        assert_eq!(rendered.headers().get("Total-Count").unwrap(), "3");
        assert_eq!(
            rendered.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
