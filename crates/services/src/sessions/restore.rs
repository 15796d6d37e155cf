use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{QuestionStatus, SessionSnapshot, WrongAnswerRecord};
use tracing::debug;

use super::service::{QuizSession, View, WrongAnswer};
use crate::error::SessionError;

impl QuizSession {
    /// Project the session into its persisted form.
    #[must_use]
    pub fn snapshot(&self, clock: &Clock) -> SessionSnapshot {
        SessionSnapshot {
            question_order: self.questions.iter().map(|q| q.id()).collect(),
            current_index: self.current,
            answered_count: self.answered_count,
            correct_count: self.correct_count,
            wrong_count: self.wrong_count,
            question_status_map: self.status.clone(),
            wrong_answers: self
                .wrong_answers
                .iter()
                .map(|w| WrongAnswerRecord {
                    question_id: w.question.id(),
                    selected_answers: w.selected.clone(),
                })
                .collect(),
            flagged_questions: self.flagged.iter().copied().collect(),
            saved_at: Some(clock.now()),
        }
    }

    /// Snapshot worth persisting: only while a quiz or review has questions.
    #[must_use]
    pub fn persistable_snapshot(&self, clock: &Clock) -> Option<SessionSnapshot> {
        (self.view.is_active() && !self.questions.is_empty()).then(|| self.snapshot(clock))
    }

    /// Rebuild the session from a snapshot against the current catalog.
    ///
    /// Ids that no longer resolve are dropped, wrong statuses without a log
    /// record are dropped, the cursor is clamped, and the answer display of
    /// the current question is rebuilt from history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` (leaving the session untouched) when no
    /// question of the snapshot resolves.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let mut seen = HashSet::new();
        let questions: Vec<_> = snapshot
            .question_order
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.catalog.get(*id).cloned())
            .collect();
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let mut status: BTreeMap<_, _> = snapshot
            .question_status_map
            .iter()
            .filter(|(id, _)| self.catalog.contains(**id))
            .map(|(id, s)| (*id, *s))
            .collect();

        let mut logged = HashSet::new();
        let wrong_answers: Vec<_> = snapshot
            .wrong_answers
            .iter()
            .filter(|record| status.get(&record.question_id) == Some(&QuestionStatus::Wrong))
            .filter(|record| logged.insert(record.question_id))
            .filter_map(|record| {
                self.catalog.get(record.question_id).map(|q| WrongAnswer {
                    question: Arc::clone(q),
                    selected: record.selected_answers.clone(),
                })
            })
            .collect();
        // A question marked wrong must have exactly one log record.
        status.retain(|id, s| *s != QuestionStatus::Wrong || logged.contains(id));

        let flagged: BTreeSet<_> = snapshot
            .flagged_questions
            .iter()
            .copied()
            .filter(|id| self.catalog.contains(*id))
            .collect();

        let dropped = snapshot.question_order.len() - questions.len();
        let index = snapshot.current_index.min(questions.len() - 1);

        self.questions = questions;
        self.answered_count = snapshot.answered_count;
        self.correct_count = snapshot.correct_count;
        self.wrong_count = snapshot.wrong_count;
        self.status = status;
        self.wrong_answers = wrong_answers;
        self.flagged = flagged;
        self.cleared.clear();
        self.reset_answer_display();
        self.jump_to(index);
        self.view = View::Quiz;

        debug!(
            questions = self.questions.len(),
            dropped,
            current = self.current,
            "restored quiz session"
        );
        Ok(())
    }
}
