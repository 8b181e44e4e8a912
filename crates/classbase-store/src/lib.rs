//! # Classbase Store
//!
//! Document store abstraction for the Classbase API.
//!
//! Records are schemaless documents addressed by `collection/id`. The
//! [`DocumentStore`] trait covers the handful of operations the API performs
//! and is implemented by:
//!
//! - [`FirestoreStore`]: Cloud Firestore over its v1 REST API
//! - [`MemoryStore`]: an in-process store for tests and local tooling
//!
//! # Example
//!
//! ```ignore
//! use classbase_store::{DocumentPath, DocumentStore, Fields, FieldValue, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let path = DocumentPath::new("classes", "math-101");
//! let mut fields = Fields::new();
//! fields.insert("title".into(), FieldValue::from("Algebra"));
//! store.set(&path, fields).await?;
//! assert!(store.get(&path).await?.is_some());
//! ```

pub mod encoding;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod path;
pub mod store;
pub mod value;

pub use error::StoreError;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use path::{DocumentPath, InvalidSegment};
pub use store::{Document, DocumentStore};
pub use value::{FieldValue, Fields};
