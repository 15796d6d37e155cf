use async_trait::async_trait;
use quiz_core::model::UserIdentity;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("remote store returned status {0}")]
    HttpStatus(u16),

    #[error("invalid document address: {0}")]
    InvalidPath(String),
}

/// Device-local string key-value storage (get/set/remove by key).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Logical address of a document in the remote store.
///
/// Kept as separate segments so an identity containing `/` stays one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(Vec<String>);

impl DocumentPath {
    /// Split a `/`-separated path into segments; empty segments are skipped.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// `users/{identity}/sessions/current`
    #[must_use]
    pub fn session_for(identity: &UserIdentity) -> Self {
        Self(vec![
            "users".to_owned(),
            identity.as_str().to_owned(),
            "sessions".to_owned(),
            "current".to_owned(),
        ])
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Remote whole-document store (read, write, delete a JSON document by path).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document at `path`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport or decoding failures.
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Value>, StorageError>;

    /// Replace the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport failures or rejected writes.
    async fn set_document(&self, path: &DocumentPath, document: &Value) -> Result<(), StorageError>;

    /// Delete the document at `path`. Deleting a missing document is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport failures.
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StorageError>;
}

/// Simple in-memory key-value store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Simple in-memory document store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<DocumentPath, Value>>>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Value>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(path).cloned())
    }

    async fn set_document(&self, path: &DocumentPath, document: &Value) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(path.clone(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(path);
        Ok(())
    }
}

/// Aggregates the local and remote stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub local: Arc<dyn KeyValueStore>,
    pub remote: Arc<dyn DocumentStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let local: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let remote: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        Self { local, remote }
    }
}
