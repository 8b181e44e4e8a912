use async_trait::async_trait;
use serde_json::Value;

use crate::value::fields_to_json;
use crate::{DocumentPath, Fields, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn to_json(&self) -> Value {
        Value::Object(fields_to_json(&self.fields))
    }
}

/// Operations the application performs against the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Creates the document or replaces all of its fields.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Overwrites the given fields of an existing document, leaving the rest
    /// untouched. Fails with [`StoreError::NotFound`] if it does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}
