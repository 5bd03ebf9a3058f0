use std::sync::Arc;

use crate::config::{AppConfig, PipelineConfig};
use crate::database::{DocumentStore, InMemoryDocumentStore};
use crate::pipeline::steps::*;
use crate::pipeline::{Pipeline, RequestContext};
use crate::schema::{ApiSchemaDocuments, ApiSchemaProvider, InMemoryApiSchemaProvider, SchemaError};
use crate::types::{FrontendRequest, FrontendResponse, RequestMethod};
use crate::validation::{DocumentValidator, JsonSchemaDocumentValidator};

/// Entry point for frontends. Owns one pipeline per method, built once.
pub struct ApiService {
    schema_provider: Arc<dyn ApiSchemaProvider>,
    post: Pipeline,
    put: Pipeline,
    get: Pipeline,
    delete: Pipeline,
}

impl ApiService {
    pub fn new(
        schema_provider: Arc<dyn ApiSchemaProvider>,
        store: Arc<dyn DocumentStore>,
        validator: Arc<dyn DocumentValidator>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            post: build_post_pipeline(&schema_provider, &store, &validator, config),
            put: build_put_pipeline(&schema_provider, &store, &validator, config),
            get: build_get_pipeline(&schema_provider, &store, config),
            delete: build_delete_pipeline(&schema_provider, &store, config),
            schema_provider,
        }
    }

    /// In-memory store and the default validator over the given schema
    pub fn with_schema(documents: ApiSchemaDocuments, config: &PipelineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryApiSchemaProvider::new(documents)),
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(JsonSchemaDocumentValidator::new()),
            config,
        )
    }

    /// Loads the configured ApiSchema file, or the bundled sample when unset
    pub fn from_config(config: &AppConfig) -> Result<Self, SchemaError> {
        let documents = match &config.schema.api_schema_path {
            Some(path) => {
                tracing::info!("Loading ApiSchema from {}", path.display());
                ApiSchemaDocuments::from_path(path)?
            }
            None => {
                tracing::info!("Loading bundled sample ApiSchema");
                ApiSchemaDocuments::sample()?
            }
        };
        Ok(Self::with_schema(documents, &config.pipeline))
    }

    pub fn schema_provider(&self) -> &Arc<dyn ApiSchemaProvider> {
        &self.schema_provider
    }

    pub fn is_schema_loaded(&self) -> bool {
        self.schema_provider.documents().is_some()
    }

    pub fn pipeline(&self, method: RequestMethod) -> &Pipeline {
        match method {
            RequestMethod::Post => &self.post,
            RequestMethod::Put => &self.put,
            RequestMethod::Get => &self.get,
            RequestMethod::Delete => &self.delete,
        }
    }

    pub async fn handle(&self, request: FrontendRequest) -> FrontendResponse {
        let pipeline = self.pipeline(request.method);
        let mut ctx = RequestContext::new(request);
        pipeline.run(&mut ctx).await
    }

    pub async fn upsert(&self, request: FrontendRequest) -> FrontendResponse {
        self.post.run(&mut RequestContext::new(request)).await
    }

    pub async fn get(&self, request: FrontendRequest) -> FrontendResponse {
        self.get.run(&mut RequestContext::new(request)).await
    }

    pub async fn update(&self, request: FrontendRequest) -> FrontendResponse {
        self.put.run(&mut RequestContext::new(request)).await
    }

    pub async fn delete(&self, request: FrontendRequest) -> FrontendResponse {
        self.delete.run(&mut RequestContext::new(request)).await
    }
}

fn common_prefix(pipeline: Pipeline, schema_provider: &Arc<dyn ApiSchemaProvider>) -> Pipeline {
    pipeline
        .with_step(Box::new(ProvideApiSchemaStep::new(schema_provider.clone())))
        .with_step(Box::new(ParsePathStep))
        .with_step(Box::new(ValidateEndpointStep))
}

fn build_post_pipeline(
    schema_provider: &Arc<dyn ApiSchemaProvider>,
    store: &Arc<dyn DocumentStore>,
    validator: &Arc<dyn DocumentValidator>,
    config: &PipelineConfig,
) -> Pipeline {
    let mut pipeline = common_prefix(Pipeline::new("upsert"), schema_provider)
        .with_step(Box::new(ParseBodyStep))
        .with_step(Box::new(RequestBodyLoggingStep::new(config.mask_request_body)))
        .with_step(Box::new(DuplicatePropertiesStep::new(config.duplicate_property_strategy)))
        .with_step(Box::new(RejectResourceIdentifierStep))
        .with_step(Box::new(CoerceDateTimesStep));

    if !config.bypass_string_type_coercion {
        pipeline.register_step(Box::new(CoerceFromStringsStep));
    }

    pipeline
        .with_step(Box::new(ValidateDocumentStep::new(validator.clone())))
        .with_step(Box::new(ValidateDecimalStep))
        .with_step(Box::new(ValidateEqualityConstraintStep))
        .with_step(Box::new(BuildResourceInfoStep::new(
            config.allow_identity_update_overrides.clone(),
        )))
        .with_step(Box::new(ExtractDocumentInfoStep))
        .with_step(Box::new(DisallowDuplicateReferencesStep))
        .with_step(Box::new(ArrayUniquenessStep))
        .with_step(Box::new(UpsertHandlerStep::new(store.clone())))
}

fn build_put_pipeline(
    schema_provider: &Arc<dyn ApiSchemaProvider>,
    store: &Arc<dyn DocumentStore>,
    validator: &Arc<dyn DocumentValidator>,
    config: &PipelineConfig,
) -> Pipeline {
    let mut pipeline = common_prefix(Pipeline::new("update"), schema_provider)
        .with_step(Box::new(ParseBodyStep))
        .with_step(Box::new(RequestBodyLoggingStep::new(config.mask_request_body)))
        .with_step(Box::new(DuplicatePropertiesStep::new(config.duplicate_property_strategy)))
        .with_step(Box::new(CoerceDateTimesStep));

    if !config.bypass_string_type_coercion {
        pipeline.register_step(Box::new(CoerceFromStringsStep));
    }

    pipeline
        .with_step(Box::new(ValidateDocumentStep::new(validator.clone())))
        .with_step(Box::new(ValidateDecimalStep))
        .with_step(Box::new(ValidateMatchingDocumentUuidsStep))
        .with_step(Box::new(ValidateEqualityConstraintStep))
        .with_step(Box::new(BuildResourceInfoStep::new(
            config.allow_identity_update_overrides.clone(),
        )))
        .with_step(Box::new(ExtractDocumentInfoStep))
        .with_step(Box::new(DisallowDuplicateReferencesStep))
        .with_step(Box::new(ArrayUniquenessStep))
        .with_step(Box::new(UpdateHandlerStep::new(store.clone())))
}

fn build_get_pipeline(
    schema_provider: &Arc<dyn ApiSchemaProvider>,
    store: &Arc<dyn DocumentStore>,
    config: &PipelineConfig,
) -> Pipeline {
    common_prefix(Pipeline::new("get"), schema_provider)
        .with_step(Box::new(BuildResourceInfoStep::new(
            config.allow_identity_update_overrides.clone(),
        )))
        .with_step(Box::new(ValidateQueryStep::new(config.max_page_size)))
        .with_step(Box::new(GetByIdHandlerStep::new(store.clone())))
        .with_step(Box::new(QueryHandlerStep::new(store.clone())))
}

fn build_delete_pipeline(
    schema_provider: &Arc<dyn ApiSchemaProvider>,
    store: &Arc<dyn DocumentStore>,
    config: &PipelineConfig,
) -> Pipeline {
    common_prefix(Pipeline::new("delete"), schema_provider)
        .with_step(Box::new(BuildResourceInfoStep::new(
            config.allow_identity_update_overrides.clone(),
        )))
        .with_step(Box::new(DeleteHandlerStep::new(store.clone())))
}
