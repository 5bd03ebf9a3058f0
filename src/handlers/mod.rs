// HTTP frontend: maps axum requests onto the pipeline service and renders
// FrontendResponse values back out. No business rules live here.

pub mod health;
pub mod resource;

pub use health::health;
pub use resource::resource_request;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::services::ApiService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ApiService>,
    pub path_base: Arc<str>,
}

pub fn app(service: Arc<ApiService>, api: &ApiConfig) -> Router {
    let path_base = api.path_base.trim_matches('/').to_string();
    let state = AppState {
        service,
        path_base: Arc::from(path_base.as_str()),
    };

    Router::new()
        .route("/health", get(health))
        .route(
            &format!("/{}/*path", path_base),
            get(resource_request)
                .post(resource_request)
                .put(resource_request)
                .delete(resource_request),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
