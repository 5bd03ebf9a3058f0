use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::{
    DeleteResult, DocumentStore, QueryRequest, QueryResult, StoreError, UpdateRequest, UpdateResult, UpsertRequest,
    UpsertResult,
};
use crate::json_path::{value_to_string, JsonPath};
use crate::types::{DocumentIdentity, DocumentUuid, LogicalType, QueryElement, ResourceInfo};
use crate::validation::formats;

#[derive(Debug, Clone)]
struct StoredDocument {
    identity: DocumentIdentity,
    body: Value,
}

/// Process-local store keyed by `(project, resource)`, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, IndexMap<DocumentUuid, StoredDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, resource_info: &ResourceInfo) -> usize {
        self.collections
            .read()
            .await
            .get(&collection_key(resource_info))
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

fn collection_key(resource_info: &ResourceInfo) -> String {
    format!("{}/{}", resource_info.project_name, resource_info.resource_name)
}

fn without_id(mut body: Value) -> Value {
    if let Some(object) = body.as_object_mut() {
        object.remove("id");
    }
    body
}

fn with_id(body: &Value, id: DocumentUuid) -> Value {
    let mut body = body.clone();
    if let Some(object) = body.as_object_mut() {
        object.insert("id".to_string(), Value::String(id.to_string()));
    }
    body
}

fn value_matches(stored: &Value, wanted: &str, logical_type: LogicalType) -> bool {
    let stored = value_to_string(stored);
    match logical_type {
        LogicalType::Number => match (stored.parse::<f64>(), wanted.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        LogicalType::DateTime => match (formats::parse_date_time(&stored), formats::parse_date_time(wanted)) {
            (Some(a), Some(b)) => a == b,
            _ => stored == wanted,
        },
        _ => stored.eq_ignore_ascii_case(wanted),
    }
}

fn element_matches(body: &Value, element: &QueryElement) -> bool {
    element.document_paths.iter().any(|path| match JsonPath::parse(path) {
        Ok(path) => path
            .select(body)
            .into_iter()
            .any(|v| value_matches(v, &element.value, element.logical_type)),
        Err(e) => {
            tracing::warn!("Ignoring unparsable query path: {}", e);
            false
        }
    })
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upsert(&self, request: UpsertRequest) -> Result<UpsertResult, StoreError> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(collection_key(&request.resource_info)).or_default();
        let identity = request.document_info.document_identity;

        let existing = collection
            .iter()
            .find(|(_, stored)| stored.identity == identity)
            .map(|(id, _)| *id);

        let body = without_id(request.body);
        match existing {
            Some(id) => {
                collection.insert(id, StoredDocument { identity, body });
                tracing::debug!("Updated {} {} by identity", request.resource_info.resource_name, id);
                Ok(UpsertResult::Updated(id))
            }
            None => {
                let id = request.candidate_uuid;
                collection.insert(id, StoredDocument { identity, body });
                tracing::debug!("Inserted {} {}", request.resource_info.resource_name, id);
                Ok(UpsertResult::Inserted(id))
            }
        }
    }

    async fn get_by_id(&self, resource_info: &ResourceInfo, id: DocumentUuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection_key(resource_info))
            .and_then(|c| c.get(&id))
            .map(|stored| with_id(&stored.body, id)))
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResult, StoreError> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&collection_key(&request.resource_info)) else {
            return Ok(QueryResult::default());
        };

        let matching: Vec<Value> = collection
            .iter()
            .filter(|(_, stored)| {
                request
                    .query_elements
                    .iter()
                    .all(|element| element_matches(&stored.body, element))
            })
            .map(|(id, stored)| with_id(&stored.body, *id))
            .collect();

        let total_count = matching.len();
        let offset = request.pagination.offset.unwrap_or(0) as usize;
        let limit = request.pagination.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let documents = matching.into_iter().skip(offset).take(limit).collect();

        Ok(QueryResult { documents, total_count })
    }

    async fn update_by_id(&self, request: UpdateRequest) -> Result<UpdateResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(&collection_key(&request.resource_info)) else {
            return Ok(UpdateResult::NotFound);
        };
        let Some(stored) = collection.get_mut(&request.document_uuid) else {
            return Ok(UpdateResult::NotFound);
        };

        let identity = request.document_info.document_identity;
        if stored.identity != identity && !request.resource_info.allow_identity_updates {
            return Ok(UpdateResult::ImmutableIdentity);
        }

        stored.identity = identity;
        stored.body = without_id(request.body);
        Ok(UpdateResult::Updated)
    }

    async fn delete_by_id(&self, resource_info: &ResourceInfo, id: DocumentUuid) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(&collection_key(resource_info))
            .and_then(|c| c.shift_remove(&id));
        Ok(match removed {
            Some(_) => DeleteResult::Deleted,
            None => DeleteResult::NotFound,
        })
    }
}
