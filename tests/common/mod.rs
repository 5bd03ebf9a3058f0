#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use edfi_dms_rust::config::AppConfig;
use edfi_dms_rust::handlers;
use edfi_dms_rust::schema::ApiSchemaDocuments;
use edfi_dms_rust::services::ApiService;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Root of the resource routes, e.g. `http://127.0.0.1:4321/data`
    pub data_url: String,
}

/// Serves the bundled sample schema on a free port inside the calling test's runtime
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::development()).await
}

pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);
    let data_url = format!("{}/{}", base_url, config.api.path_base);

    let app = handlers::app(Arc::new(sample_service(&config)?), &config.api);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test port")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        port,
        base_url,
        data_url,
    })
}

pub fn sample_service(config: &AppConfig) -> Result<ApiService> {
    let schema = ApiSchemaDocuments::sample().context("sample schema must load")?;
    Ok(ApiService::with_schema(schema, &config.pipeline))
}

pub fn school(school_id: i64) -> Value {
    json!({
        "schoolId": school_id,
        "nameOfInstitution": "Grand Bend High School",
        "gradeLevels": [
            {"gradeLevelDescriptor": "uri://ed-fi.org/GradeLevelDescriptor#Tenth grade"}
        ],
        "educationOrganizationCategories": [
            {"educationOrganizationCategoryDescriptor": "uri://ed-fi.org/EducationOrganizationCategoryDescriptor#School"}
        ]
    })
}
