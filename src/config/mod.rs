use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::DuplicatePropertyStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub pipeline: PipelineConfig,
    pub api: ApiConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Settings that shape the request pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mask_request_body: bool,
    pub bypass_string_type_coercion: bool,
    /// Resource names that may change identity on PUT regardless of schema
    pub allow_identity_update_overrides: Vec<String>,
    pub duplicate_property_strategy: DuplicatePropertyStrategy,
    pub max_page_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub path_base: String,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// ApiSchema file; the bundled sample is used when unset
    pub api_schema_path: Option<PathBuf>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pipeline.max_page_size must be greater than 0")]
    InvalidMaxPageSize,

    #[error("api.path_base must be a non-empty segment without slashes, got '{0}'")]
    InvalidPathBase(String),

    #[error("pipeline.allow_identity_update_overrides contains an empty resource name")]
    EmptyIdentityUpdateOverride,

    #[error("schema.api_schema_path does not exist: {0}")]
    MissingSchemaFile(String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Pipeline overrides
        if let Ok(v) = env::var("PIPELINE_MASK_REQUEST_BODY") {
            self.pipeline.mask_request_body = v.parse().unwrap_or(self.pipeline.mask_request_body);
        }
        if let Ok(v) = env::var("PIPELINE_BYPASS_STRING_TYPE_COERCION") {
            self.pipeline.bypass_string_type_coercion =
                v.parse().unwrap_or(self.pipeline.bypass_string_type_coercion);
        }
        if let Ok(v) = env::var("PIPELINE_ALLOW_IDENTITY_UPDATE_OVERRIDES") {
            self.pipeline.allow_identity_update_overrides = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("PIPELINE_DUPLICATE_PROPERTY_STRATEGY") {
            self.pipeline.duplicate_property_strategy =
                DuplicatePropertyStrategy::parse(&v).unwrap_or(self.pipeline.duplicate_property_strategy);
        }
        if let Ok(v) = env::var("PIPELINE_MAX_PAGE_SIZE") {
            self.pipeline.max_page_size = v.parse().unwrap_or(self.pipeline.max_page_size);
        }

        // API overrides
        if let Ok(v) = env::var("DMS_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("DMS_PATH_BASE") {
            self.api.path_base = v.trim().to_string();
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Schema overrides
        if let Ok(v) = env::var("DMS_API_SCHEMA_PATH") {
            if !v.trim().is_empty() {
                self.schema.api_schema_path = Some(PathBuf::from(v.trim()));
            }
        }

        self
    }

    /// Every problem is reported, not just the first
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.pipeline.max_page_size == 0 {
            errors.push(ConfigError::InvalidMaxPageSize);
        }
        if self.api.path_base.is_empty() || self.api.path_base.contains('/') {
            errors.push(ConfigError::InvalidPathBase(self.api.path_base.clone()));
        }
        if self
            .pipeline
            .allow_identity_update_overrides
            .iter()
            .any(|name| name.trim().is_empty())
        {
            errors.push(ConfigError::EmptyIdentityUpdateOverride);
        }
        if let Some(path) = &self.schema.api_schema_path {
            if !path.exists() {
                errors.push(ConfigError::MissingSchemaFile(path.display().to_string()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            pipeline: PipelineConfig {
                mask_request_body: false,
                bypass_string_type_coercion: false,
                allow_identity_update_overrides: Vec::new(),
                duplicate_property_strategy: DuplicatePropertyStrategy::SameKey,
                max_page_size: 500,
            },
            api: ApiConfig {
                port: 3000,
                path_base: "data".to_string(),
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            schema: SchemaConfig::default(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.pipeline.mask_request_body = true;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.pipeline.mask_request_body = true;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
