//! Snapshot backends: where a serialized session lives.
//!
//! Both backends answer the same four calls so the services layer can apply a
//! single precedence rule without knowing which store it is talking to.

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{SessionSnapshot, UserIdentity};
use tracing::warn;

use crate::repository::{DocumentPath, DocumentStore, KeyValueStore, StorageError};

/// Fixed local key holding the device's snapshot, unscoped by identity.
pub const LOCAL_SNAPSHOT_KEY: &str = "quiz-session-v1";

/// Strategy interface over one snapshot location.
///
/// Malformed stored data is reported as `Ok(None)`, never as an error.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns `StorageError` if the underlying store cannot be read.
    async fn load(
        &self,
        identity: Option<&UserIdentity>,
    ) -> Result<Option<SessionSnapshot>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(
        &self,
        identity: Option<&UserIdentity>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be removed.
    async fn clear(&self, identity: Option<&UserIdentity>) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the underlying store cannot be read.
    async fn exists(&self, identity: Option<&UserIdentity>) -> Result<bool, StorageError> {
        Ok(self.load(identity).await?.is_some())
    }
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Device-local snapshot under [`LOCAL_SNAPSHOT_KEY`]; identity is ignored.
#[derive(Clone)]
pub struct LocalSnapshotBackend {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalSnapshotBackend {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: LOCAL_SNAPSHOT_KEY.to_owned(),
        }
    }
}

#[async_trait]
impl SnapshotBackend for LocalSnapshotBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(
        &self,
        _identity: Option<&UserIdentity>,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        match SessionSnapshot::from_json(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring malformed local snapshot");
                Ok(None)
            }
        }
    }

    async fn save(
        &self,
        _identity: Option<&UserIdentity>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let raw = snapshot
            .to_json()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.set(&self.key, &raw).await
    }

    async fn clear(&self, _identity: Option<&UserIdentity>) -> Result<(), StorageError> {
        self.store.remove(&self.key).await
    }
}

//
// ─── REMOTE ────────────────────────────────────────────────────────────────────
//

/// One remote document per identity at `users/{identity}/sessions/current`.
///
/// Without an identity every call is a no-op.
#[derive(Clone)]
pub struct RemoteSnapshotBackend {
    store: Arc<dyn DocumentStore>,
}

impl RemoteSnapshotBackend {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SnapshotBackend for RemoteSnapshotBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load(
        &self,
        identity: Option<&UserIdentity>,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        let path = DocumentPath::session_for(identity);
        let Some(document) = self.store.get_document(&path).await? else {
            return Ok(None);
        };
        match SessionSnapshot::from_value(document) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(%path, error = %err, "ignoring malformed remote snapshot");
                Ok(None)
            }
        }
    }

    async fn save(
        &self,
        identity: Option<&UserIdentity>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let Some(identity) = identity else {
            return Ok(());
        };
        let document = serde_json::to_value(snapshot)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store
            .set_document(&DocumentPath::session_for(identity), &document)
            .await
    }

    async fn clear(&self, identity: Option<&UserIdentity>) -> Result<(), StorageError> {
        let Some(identity) = identity else {
            return Ok(());
        };
        self.store
            .delete_document(&DocumentPath::session_for(identity))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryDocumentStore, InMemoryKeyValueStore};
    use quiz_core::model::QuestionId;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn snapshot(order: &[u64]) -> SessionSnapshot {
        SessionSnapshot {
            question_order: order.iter().copied().map(QuestionId::new).collect(),
            current_index: 0,
            answered_count: 0,
            correct_count: 0,
            wrong_count: 0,
            question_status_map: BTreeMap::new(),
            wrong_answers: Vec::new(),
            flagged_questions: Vec::new(),
            saved_at: None,
        }
    }

    #[tokio::test]
    async fn local_round_trips_under_fixed_key() {
        let kv = InMemoryKeyValueStore::new();
        let backend = LocalSnapshotBackend::new(Arc::new(kv.clone()));

        backend.save(None, &snapshot(&[3, 1, 2])).await.unwrap();

        assert!(kv.get(LOCAL_SNAPSHOT_KEY).await.unwrap().is_some());
        let loaded = backend.load(None).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot(&[3, 1, 2]));
        assert!(backend.exists(None).await.unwrap());

        backend.clear(None).await.unwrap();
        assert!(!backend.exists(None).await.unwrap());
    }

    #[tokio::test]
    async fn local_ignores_corrupt_payload() {
        let kv = InMemoryKeyValueStore::new();
        kv.set(LOCAL_SNAPSHOT_KEY, "{\"questionOrder\": [1").await.unwrap();
        let backend = LocalSnapshotBackend::new(Arc::new(kv));

        assert_eq!(backend.load(None).await.unwrap(), None);
        assert!(!backend.exists(None).await.unwrap());
    }

    #[tokio::test]
    async fn remote_requires_identity() {
        let docs = InMemoryDocumentStore::new();
        let backend = RemoteSnapshotBackend::new(Arc::new(docs.clone()));

        backend.save(None, &snapshot(&[1])).await.unwrap();
        assert_eq!(backend.load(None).await.unwrap(), None);

        let alice = UserIdentity::new("alice");
        backend.save(Some(&alice), &snapshot(&[9, 8])).await.unwrap();
        let stored = docs
            .get_document(&DocumentPath::session_for(&alice))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["questionOrder"], json!([9, 8]));

        let loaded = backend.load(Some(&alice)).await.unwrap().unwrap();
        assert_eq!(loaded.question_order.len(), 2);
        assert_eq!(
            backend.load(Some(&UserIdentity::new("bob"))).await.unwrap(),
            None
        );

        backend.clear(Some(&alice)).await.unwrap();
        assert!(!backend.exists(Some(&alice)).await.unwrap());
    }

    #[tokio::test]
    async fn remote_ignores_document_with_broken_tallies() {
        let docs = InMemoryDocumentStore::new();
        let alice = UserIdentity::new("alice");
        docs.set_document(
            &DocumentPath::session_for(&alice),
            &json!({
                "questionOrder": [1],
                "currentIndex": 0,
                "answeredCount": 3,
                "correctCount": 1,
                "wrongCount": 1
            }),
        )
        .await
        .unwrap();

        let backend = RemoteSnapshotBackend::new(Arc::new(docs));
        assert_eq!(backend.load(Some(&alice)).await.unwrap(), None);
    }
}
