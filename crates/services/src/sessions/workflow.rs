use quiz_core::Clock;
use quiz_core::model::{SessionSnapshot, UserIdentity};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::service::QuizSession;
use crate::error::SessionError;
use crate::persistence::SessionPersistence;

/// Orchestrates a [`QuizSession`] against its persistence backends.
#[derive(Clone)]
pub struct QuizWorkflow {
    clock: Clock,
    persistence: SessionPersistence,
}

impl QuizWorkflow {
    #[must_use]
    pub fn new(clock: Clock, persistence: SessionPersistence) -> Self {
        Self { clock, persistence }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }

    /// Load the preferred saved snapshot and restore it into `session`.
    ///
    /// Returns `false` when nothing usable was saved; the session is then unchanged.
    pub async fn resume(&self, session: &mut QuizSession, identity: Option<&UserIdentity>) -> bool {
        let Some(snapshot) = self.persistence.load(identity).await else {
            return false;
        };
        match session.restore(&snapshot) {
            Ok(()) => {
                info!(
                    questions = session.questions().len(),
                    answered = session.answered_count(),
                    "resumed saved quiz session"
                );
                true
            }
            Err(SessionError::Empty) => {
                debug!("saved snapshot has no questions left in the catalog");
                false
            }
        }
    }

    /// Save the session if it is in a persistable state.
    pub async fn persist(&self, session: &QuizSession, identity: Option<&UserIdentity>) {
        if let Some(snapshot) = session.persistable_snapshot(&self.clock) {
            self.persistence.save(identity, &snapshot).await;
        }
    }

    pub async fn has_saved_session(&self, identity: Option<&UserIdentity>) -> bool {
        self.persistence.has_saved_session(identity).await
    }

    /// Discard any saved snapshot and begin a fresh session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the catalog has no questions.
    pub async fn start_over(
        &self,
        session: &mut QuizSession,
        identity: Option<&UserIdentity>,
    ) -> Result<(), SessionError> {
        self.persistence.clear(identity).await;
        session.start_session()
    }

    /// Spawn the background task that applies fire-and-forget writes in order.
    ///
    /// The task ends once every [`SnapshotWriter`] clone is dropped and the
    /// queue is drained.
    #[must_use]
    pub fn spawn_writer(&self) -> (SnapshotWriter, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();
        let persistence = self.persistence.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                persistence
                    .save(request.identity.as_ref(), &request.snapshot)
                    .await;
            }
            debug!("snapshot writer stopped");
        });
        (SnapshotWriter { tx, clock: self.clock }, handle)
    }
}

struct SaveRequest {
    identity: Option<UserIdentity>,
    snapshot: SessionSnapshot,
}

/// Non-blocking handle for queuing snapshot writes.
#[derive(Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<SaveRequest>,
    clock: Clock,
}

impl SnapshotWriter {
    /// Queue a save of `session` if it is persistable. Returns whether a write was queued.
    pub fn submit(&self, session: &QuizSession, identity: Option<&UserIdentity>) -> bool {
        match session.persistable_snapshot(&self.clock) {
            Some(snapshot) => self.submit_snapshot(identity.cloned(), snapshot),
            None => false,
        }
    }

    /// Queue a prepared snapshot. Returns false if the writer task is gone.
    pub fn submit_snapshot(&self, identity: Option<UserIdentity>, snapshot: SessionSnapshot) -> bool {
        self.tx.send(SaveRequest { identity, snapshot }).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::service::tests::{catalog, question};
    use quiz_core::model::{AnswerMode, OptionId};
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::Storage;

    fn workflow() -> QuizWorkflow {
        QuizWorkflow::new(
            fixed_clock(),
            SessionPersistence::from_storage(&Storage::in_memory()),
        )
    }

    #[tokio::test]
    async fn persist_then_resume_in_a_new_session() {
        let cat = catalog(
            (1..=3)
                .map(|id| question(id, None, AnswerMode::Single, &["a"]))
                .collect(),
        );
        let workflow = workflow();
        let mut session = QuizSession::with_seed(Arc::clone(&cat), 1);

        workflow.persist(&session, None).await;
        assert!(!workflow.has_saved_session(None).await);

        session.start_session().unwrap();
        session.select_option(&OptionId::new("a"));
        session.check_answer().unwrap();
        workflow.persist(&session, None).await;

        let mut resumed = QuizSession::with_seed(cat, 2);
        assert!(workflow.resume(&mut resumed, None).await);
        assert_eq!(resumed.answered_count(), 1);
        assert_eq!(resumed.questions(), session.questions());
    }

    #[tokio::test]
    async fn start_over_discards_saved_snapshot() {
        let cat = catalog(vec![question(1, None, AnswerMode::Single, &["a"])]);
        let workflow = workflow();
        let mut session = QuizSession::with_seed(cat, 1);
        session.start_session().unwrap();
        workflow.persist(&session, None).await;

        workflow.start_over(&mut session, None).await.unwrap();

        assert!(!workflow.has_saved_session(None).await);
        assert_eq!(session.answered_count(), 0);
    }

    #[tokio::test]
    async fn writer_applies_queued_saves_in_order() {
        let cat = catalog(
            (1..=2)
                .map(|id| question(id, None, AnswerMode::Single, &["a"]))
                .collect(),
        );
        let workflow = workflow();
        let (writer, handle) = workflow.spawn_writer();
        let mut session = QuizSession::with_seed(cat, 4);
        session.start_session().unwrap();

        assert!(writer.submit(&session, None));
        session.select_option(&OptionId::new("b"));
        session.check_answer().unwrap();
        assert!(writer.submit(&session, None));
        drop(writer);
        handle.await.unwrap();

        let saved = workflow.persistence().load(None).await.unwrap();
        assert_eq!(saved.answered_count, 1);
        assert_eq!(saved.wrong_count, 1);
    }
}
