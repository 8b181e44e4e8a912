use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::path::check_collection;
use crate::{Document, DocumentPath, DocumentStore, Fields, StoreError};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, endpoint: &str) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.check_available("get")?;
        path.validate()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .map(|fields| Document {
                path: path.clone(),
                fields: fields.clone(),
            }))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.check_available("set")?;
        path.validate()?;
        self.collections
            .write()
            .await
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), fields);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.check_available("update")?;
        path.validate()?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(&path.collection)
            .and_then(|docs| docs.get_mut(&path.id))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.check_available("delete")?;
        path.validate()?;
        if let Some(docs) = self.collections.write().await.get_mut(&path.collection) {
            docs.remove(&path.id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.check_available("list")?;
        check_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        path: DocumentPath::new(collection, id.clone()),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
