// Document persistence collaborator used by the terminal pipeline steps

pub mod memory;

pub use memory::InMemoryDocumentStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::{DocumentInfo, DocumentUuid, PaginationParameters, QueryElement, ResourceInfo};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone)]
pub struct UpsertRequest {
    pub resource_info: ResourceInfo,
    pub document_info: DocumentInfo,
    pub body: Value,
    /// Used only when the identity is new
    pub candidate_uuid: DocumentUuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertResult {
    Inserted(DocumentUuid),
    Updated(DocumentUuid),
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub resource_info: ResourceInfo,
    pub document_info: DocumentInfo,
    pub body: Value,
    pub document_uuid: DocumentUuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Updated,
    NotFound,
    /// The body changed identifying values on a resource that forbids it
    ImmutableIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub resource_info: ResourceInfo,
    pub query_elements: Vec<QueryElement>,
    pub pagination: PaginationParameters,
}

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Page of documents, each with its `id` injected
    pub documents: Vec<Value>,
    pub total_count: usize,
}

/// Persistence seam. Documents handed out always carry their `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upsert(&self, request: UpsertRequest) -> Result<UpsertResult, StoreError>;

    async fn get_by_id(&self, resource_info: &ResourceInfo, id: DocumentUuid) -> Result<Option<Value>, StoreError>;

    async fn query(&self, request: QueryRequest) -> Result<QueryResult, StoreError>;

    async fn update_by_id(&self, request: UpdateRequest) -> Result<UpdateResult, StoreError>;

    async fn delete_by_id(&self, resource_info: &ResourceInfo, id: DocumentUuid) -> Result<DeleteResult, StoreError>;
}
