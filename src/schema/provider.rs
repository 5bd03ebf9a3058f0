use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::schema::{ApiSchemaDocuments, SchemaError};

/// Source of the loaded ApiSchema. Readers always get a whole snapshot;
/// a reload installs a new snapshot and never mutates the old one.
pub trait ApiSchemaProvider: Send + Sync {
    fn documents(&self) -> Option<Arc<ApiSchemaDocuments>>;

    /// Bumped every time a new snapshot is installed
    fn reload_id(&self) -> u64;
}

#[derive(Default)]
pub struct InMemoryApiSchemaProvider {
    state: RwLock<Snapshot>,
}

#[derive(Default)]
struct Snapshot {
    documents: Option<Arc<ApiSchemaDocuments>>,
    reload_id: u64,
}

impl InMemoryApiSchemaProvider {
    pub fn new(documents: ApiSchemaDocuments) -> Self {
        let provider = Self::default();
        provider.install(documents);
        provider
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        Ok(Self::new(ApiSchemaDocuments::from_path(path)?))
    }

    /// Swaps in a new snapshot atomically
    pub fn install(&self, documents: ApiSchemaDocuments) {
        let documents = Arc::new(documents);
        match self.state.write() {
            Ok(mut state) => {
                state.documents = Some(documents);
                state.reload_id += 1;
                tracing::info!("Installed ApiSchema snapshot {}", state.reload_id);
            }
            Err(poisoned) => {
                let mut state = poisoned.into_inner();
                state.documents = Some(documents);
                state.reload_id += 1;
                tracing::warn!("Installed ApiSchema snapshot {} after lock poisoning", state.reload_id);
            }
        }
    }

    pub fn reload_from_path(&self, path: &Path) -> Result<(), SchemaError> {
        let documents = ApiSchemaDocuments::from_path(path)?;
        self.install(documents);
        Ok(())
    }
}

impl ApiSchemaProvider for InMemoryApiSchemaProvider {
    fn documents(&self) -> Option<Arc<ApiSchemaDocuments>> {
        match self.state.read() {
            Ok(state) => state.documents.clone(),
            Err(poisoned) => poisoned.into_inner().documents.clone(),
        }
    }

    fn reload_id(&self) -> u64 {
        match self.state.read() {
            Ok(state) => state.reload_id,
            Err(poisoned) => poisoned.into_inner().reload_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_installs_new_snapshot_without_touching_old() {
        let provider = InMemoryApiSchemaProvider::new(ApiSchemaDocuments::sample().unwrap());
        let before = provider.documents().unwrap();
        assert_eq!(provider.reload_id(), 1);

        provider.install(ApiSchemaDocuments::new(Vec::new()));
        let after = provider.documents().unwrap();

        assert_eq!(provider.reload_id(), 2);
        assert!(!before.projects().is_empty());
        assert!(after.projects().is_empty());
    }

    #[test]
    fn test_empty_provider_has_no_documents() {
        let provider = InMemoryApiSchemaProvider::empty();
        assert!(provider.documents().is_none());
        assert_eq!(provider.reload_id(), 0);
    }
}
