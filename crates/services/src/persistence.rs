//! Dual-backend snapshot persistence.
//!
//! Every save goes to the local store and, when a user is signed in, to the
//! remote store. Failures are logged and swallowed so they never reach the
//! quiz. On resume the remote snapshot wins over the local one.

use std::sync::Arc;

use quiz_core::model::{SessionSnapshot, UserIdentity};
use storage::{LocalSnapshotBackend, RemoteSnapshotBackend, SnapshotBackend, Storage};
use tracing::{debug, warn};

/// Resume precedence: remote if present, else local.
#[must_use]
pub fn resolve_resume(
    remote: Option<SessionSnapshot>,
    local: Option<SessionSnapshot>,
) -> Option<SessionSnapshot> {
    remote.or(local)
}

#[derive(Clone)]
pub struct SessionPersistence {
    local: Arc<dyn SnapshotBackend>,
    remote: Arc<dyn SnapshotBackend>,
}

impl SessionPersistence {
    #[must_use]
    pub fn new(local: Arc<dyn SnapshotBackend>, remote: Arc<dyn SnapshotBackend>) -> Self {
        Self { local, remote }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(
            Arc::new(LocalSnapshotBackend::new(Arc::clone(&storage.local))),
            Arc::new(RemoteSnapshotBackend::new(Arc::clone(&storage.remote))),
        )
    }

    /// Write to local always and to remote when signed in. Never fails.
    pub async fn save(&self, identity: Option<&UserIdentity>, snapshot: &SessionSnapshot) {
        if let Err(err) = self.local.save(identity, snapshot).await {
            warn!(backend = self.local.name(), error = %err, "failed to save session snapshot");
        }
        if identity.is_some() {
            if let Err(err) = self.remote.save(identity, snapshot).await {
                warn!(backend = self.remote.name(), error = %err, "failed to save session snapshot");
            }
        }
    }

    /// Snapshot to resume from. The local store is only read when the remote
    /// has nothing (or is unreachable).
    pub async fn load(&self, identity: Option<&UserIdentity>) -> Option<SessionSnapshot> {
        let remote = match identity {
            Some(_) => self.read(&self.remote, identity).await,
            None => None,
        };
        let local = if remote.is_none() {
            self.read(&self.local, identity).await
        } else {
            debug!("remote snapshot found, skipping local read");
            None
        };
        resolve_resume(remote, local)
    }

    /// Whether any backend holds a usable snapshot for this identity.
    /// The remote is asked first; the local store only when it has none.
    pub async fn has_saved_session(&self, identity: Option<&UserIdentity>) -> bool {
        if identity.is_some() && self.exists(&self.remote, identity).await {
            return true;
        }
        self.exists(&self.local, identity).await
    }

    /// Remove the saved snapshot from both backends. Never fails.
    pub async fn clear(&self, identity: Option<&UserIdentity>) {
        if let Err(err) = self.local.clear(identity).await {
            warn!(backend = self.local.name(), error = %err, "failed to clear session snapshot");
        }
        if identity.is_some() {
            if let Err(err) = self.remote.clear(identity).await {
                warn!(backend = self.remote.name(), error = %err, "failed to clear session snapshot");
            }
        }
    }

    async fn exists(
        &self,
        backend: &Arc<dyn SnapshotBackend>,
        identity: Option<&UserIdentity>,
    ) -> bool {
        match backend.exists(identity).await {
            Ok(found) => found,
            Err(err) => {
                warn!(backend = backend.name(), error = %err, "failed to check for session snapshot");
                false
            }
        }
    }

    async fn read(
        &self,
        backend: &Arc<dyn SnapshotBackend>,
        identity: Option<&UserIdentity>,
    ) -> Option<SessionSnapshot> {
        match backend.load(identity).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(backend = backend.name(), error = %err, "failed to load session snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use std::collections::BTreeMap;

    fn snapshot(first: u64) -> SessionSnapshot {
        SessionSnapshot {
            question_order: vec![QuestionId::new(first)],
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

    #[test]
    fn remote_wins_when_both_exist() {
        let resolved = resolve_resume(Some(snapshot(1)), Some(snapshot(2)));
        assert_eq!(resolved, Some(snapshot(1)));
    }

    #[test]
    fn local_is_fallback() {
        assert_eq!(resolve_resume(None, Some(snapshot(2))), Some(snapshot(2)));
        assert_eq!(resolve_resume(None, None), None);
    }

    #[tokio::test]
    async fn signed_out_save_only_touches_local() {
        let storage = Storage::in_memory();
        let persistence = SessionPersistence::from_storage(&storage);

        persistence.save(None, &snapshot(5)).await;

        assert_eq!(persistence.load(None).await, Some(snapshot(5)));
        let alice = UserIdentity::new("alice");
        // Signed in, the remote is empty so the device snapshot is used.
        assert_eq!(persistence.load(Some(&alice)).await, Some(snapshot(5)));
    }

    #[tokio::test]
    async fn clear_removes_both_copies() {
        let storage = Storage::in_memory();
        let persistence = SessionPersistence::from_storage(&storage);
        let alice = UserIdentity::new("alice");

        persistence.save(Some(&alice), &snapshot(3)).await;
        assert!(persistence.has_saved_session(Some(&alice)).await);

        persistence.clear(Some(&alice)).await;
        assert!(!persistence.has_saved_session(Some(&alice)).await);
        assert!(!persistence.has_saved_session(None).await);
    }
}
