use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::AppState;

/// GET /health - ok once an ApiSchema is loaded
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.service.is_schema_loaded() {
        return Err(ApiError::service_unavailable("ApiSchema is not loaded"));
    }
    Ok(Json(json!({ "status": "ok" })))
}
