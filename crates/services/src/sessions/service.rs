use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use quiz_core::model::{
    AnswerMode, Catalog, Category, OptionId, Question, QuestionId, QuestionStatus,
};

use super::plan::{grouped_shuffle, shuffle};
use crate::error::SessionError;

//
// ─── VIEW STATE ────────────────────────────────────────────────────────────────
//

/// Which screen the session is on. Only `Quiz` and `Review` are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Landing,
    Quiz,
    Review,
}

impl View {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, View::Quiz | View::Review)
    }
}

//
// ─── EVALUATION RESULT ─────────────────────────────────────────────────────────
//

/// A question currently marked wrong, with the options chosen on its first miss.
#[derive(Debug, Clone, PartialEq)]
pub struct WrongAnswer {
    pub question: Arc<Question>,
    pub selected: Vec<OptionId>,
}

/// Outcome of checking the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub question_id: QuestionId,
    pub is_correct: bool,
    /// Status recorded after this check (may differ from `is_correct`
    /// when a correct question is re-checked after a reshuffle).
    pub status: QuestionStatus,
    /// True when this was the question's first evaluation.
    pub first_attempt: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single-user quiz session.
///
/// Owns question ordering, the answer cursor, tallies, the status map, the
/// wrong-answer log and the flagged set. Every operation is synchronous;
/// persistence lives in [`crate::sessions::QuizWorkflow`].
pub struct QuizSession {
    pub(super) catalog: Arc<Catalog>,
    rng: StdRng,
    pub(super) view: View,
    pub(super) questions: Vec<Arc<Question>>,
    pub(super) current: usize,
    pub(super) selection: Vec<OptionId>,
    pub(super) checked: bool,
    pub(super) correct: bool,
    pub(super) answered_count: u32,
    pub(super) correct_count: u32,
    pub(super) wrong_count: u32,
    pub(super) status: BTreeMap<QuestionId, QuestionStatus>,
    pub(super) wrong_answers: Vec<WrongAnswer>,
    pub(super) flagged: BTreeSet<QuestionId>,
    pub(super) cleared: HashSet<QuestionId>,
}

impl QuizSession {
    /// Create an idle session (landing view) over the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_rng(catalog, StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic ordering for tests and reproducible runs.
    #[must_use]
    pub fn with_seed(catalog: Arc<Catalog>, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(catalog: Arc<Catalog>, rng: StdRng) -> Self {
        Self {
            catalog,
            rng,
            view: View::Landing,
            questions: Vec::new(),
            current: 0,
            selection: Vec::new(),
            checked: false,
            correct: false,
            answered_count: 0,
            correct_count: 0,
            wrong_count: 0,
            status: BTreeMap::new(),
            wrong_answers: Vec::new(),
            flagged: BTreeSet::new(),
            cleared: HashSet::new(),
        }
    }

    // ─── starting ─────────────────────────────────────────────────────────────

    /// Start a fresh session over the whole catalog, one category at a time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the catalog has no questions.
    pub fn start_session(&mut self) -> Result<(), SessionError> {
        let ordered = grouped_shuffle(self.catalog.questions().to_vec(), &mut self.rng);
        self.begin_fresh(ordered)
    }

    /// Start a fresh session restricted to one category (`None` = uncategorized).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no question matches.
    pub fn start_category_session(&mut self, category: Option<Category>) -> Result<(), SessionError> {
        let ordered = grouped_shuffle(self.catalog.in_category(category), &mut self.rng);
        self.begin_fresh(ordered)
    }

    /// Practice only the questions currently in the wrong-answer log.
    ///
    /// Tallies, statuses and flags carry over so a correct retry flips the
    /// question from wrong to correct.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if there are no wrong answers.
    pub fn retry_wrong_answers(&mut self) -> Result<(), SessionError> {
        let subset: Vec<_> = self
            .wrong_answers
            .iter()
            .map(|w| Arc::clone(&w.question))
            .collect();
        self.begin_subset(subset)
    }

    /// Practice only the flagged questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing is flagged.
    pub fn retry_flagged_questions(&mut self) -> Result<(), SessionError> {
        let subset: Vec<_> = self
            .flagged
            .iter()
            .filter_map(|id| self.catalog.get(*id).cloned())
            .collect();
        self.begin_subset(subset)
    }

    fn begin_fresh(&mut self, ordered: Vec<Arc<Question>>) -> Result<(), SessionError> {
        if ordered.is_empty() {
            return Err(SessionError::Empty);
        }
        self.answered_count = 0;
        self.correct_count = 0;
        self.wrong_count = 0;
        self.status.clear();
        self.wrong_answers.clear();
        self.flagged.clear();
        self.install(ordered);
        debug!(questions = self.questions.len(), "started new quiz session");
        Ok(())
    }

    fn begin_subset(&mut self, subset: Vec<Arc<Question>>) -> Result<(), SessionError> {
        if subset.is_empty() {
            return Err(SessionError::Empty);
        }
        let ordered = shuffle(subset, &mut self.rng);
        self.install(ordered);
        debug!(questions = self.questions.len(), "started retry session");
        Ok(())
    }

    fn install(&mut self, ordered: Vec<Arc<Question>>) {
        self.questions = ordered;
        self.current = 0;
        self.cleared.clear();
        self.reset_answer_display();
        self.view = View::Quiz;
    }

    pub(super) fn reset_answer_display(&mut self) {
        self.selection.clear();
        self.checked = false;
        self.correct = false;
    }

    // ─── answering ────────────────────────────────────────────────────────────

    /// Select an option on the current question.
    ///
    /// Single-answer questions replace the selection; multiple-answer
    /// questions toggle membership. Ignored once the answer is checked or
    /// when the option does not belong to the question.
    pub fn select_option(&mut self, option: &OptionId) {
        if self.checked {
            return;
        }
        let Some(question) = self.current_question() else {
            return;
        };
        if !question.has_option(option) {
            return;
        }

        match question.mode() {
            AnswerMode::Single => {
                self.selection.clear();
                self.selection.push(option.clone());
            }
            AnswerMode::Multiple => {
                if let Some(pos) = self.selection.iter().position(|o| o == option) {
                    self.selection.remove(pos);
                } else {
                    self.selection.push(option.clone());
                }
            }
        }
    }

    /// Evaluate the current selection.
    ///
    /// Returns `None` (and changes nothing) when there is no current question,
    /// the selection is empty, or the answer is already checked.
    pub fn check_answer(&mut self) -> Option<Evaluation> {
        if self.checked || self.selection.is_empty() {
            return None;
        }
        let question = Arc::clone(self.current_question()?);
        let id = question.id();
        let is_correct = question.is_correct(&self.selection);
        let prior = self.status.get(&id).copied();

        match prior {
            None => {
                self.answered_count = self.answered_count.saturating_add(1);
                self.status.insert(id, QuestionStatus::from_correct(is_correct));
                if is_correct {
                    self.correct_count = self.correct_count.saturating_add(1);
                } else {
                    self.wrong_count = self.wrong_count.saturating_add(1);
                    self.wrong_answers.push(WrongAnswer {
                        question,
                        selected: self.selection.clone(),
                    });
                }
            }
            Some(QuestionStatus::Wrong) if is_correct => {
                self.status.insert(id, QuestionStatus::Correct);
                self.wrong_count = self.wrong_count.saturating_sub(1);
                self.correct_count = self.correct_count.saturating_add(1);
                self.wrong_answers.retain(|w| w.question.id() != id);
            }
            // Wrong again keeps the first wrong selection; a correct status never regresses.
            Some(QuestionStatus::Wrong | QuestionStatus::Correct) => {}
        }

        self.checked = true;
        self.correct = is_correct;
        self.cleared.remove(&id);

        Some(Evaluation {
            question_id: id,
            is_correct,
            status: self.status.get(&id).copied().unwrap_or(QuestionStatus::from_correct(is_correct)),
            first_attempt: prior.is_none(),
        })
    }

    /// Hide a wrong result so the question can be attempted again.
    ///
    /// Display-only: tallies, status and the wrong-answer log are untouched.
    pub fn clear_answer(&mut self) {
        if !self.checked || self.correct {
            return;
        }
        let Some(id) = self.current_question().map(|q| q.id()) else {
            return;
        };
        self.cleared.insert(id);
        self.reset_answer_display();
    }

    // ─── navigation ───────────────────────────────────────────────────────────

    /// Move to the next unanswered question.
    ///
    /// Prefers the current question's category, then any category, scanning
    /// forward cyclically. When every question has a status the working set
    /// is reshuffled and the cursor returns to the start.
    pub fn next_question(&mut self) {
        let len = self.questions.len();
        if len == 0 {
            return;
        }

        let start = self.current;
        let category = self.questions[start].category();
        let unanswered = |idx: usize| !self.status.contains_key(&self.questions[idx].id());

        let in_category = (1..len)
            .map(|offset| (start + offset) % len)
            .find(|&idx| self.questions[idx].category() == category && unanswered(idx));
        let target = in_category.or_else(|| {
            (1..=len)
                .map(|offset| (start + offset) % len)
                .find(|&idx| unanswered(idx))
        });

        self.reset_answer_display();
        match target {
            Some(idx) => self.current = idx,
            None => {
                self.questions.as_mut_slice().shuffle(&mut self.rng);
                self.current = 0;
                debug!(questions = len, "every question answered, reshuffled working set");
            }
        }
    }

    /// Jump to a working-set position and rebuild its answer display from history.
    ///
    /// Out-of-range indexes are ignored.
    pub fn jump_to(&mut self, index: usize) {
        let Some(question) = self.questions.get(index).cloned() else {
            return;
        };
        self.current = index;
        let id = question.id();

        match self.status.get(&id) {
            Some(QuestionStatus::Wrong) if !self.cleared.contains(&id) => {
                self.selection = self
                    .wrong_answers
                    .iter()
                    .find(|w| w.question.id() == id)
                    .map(|w| w.selected.clone())
                    .unwrap_or_default();
                self.checked = true;
                self.correct = false;
            }
            Some(QuestionStatus::Correct) => {
                self.selection = question.correct_answers().to_vec();
                self.checked = true;
                self.correct = true;
            }
            _ => self.reset_answer_display(),
        }
    }

    // ─── flags and views ──────────────────────────────────────────────────────

    /// Flip the flag on a question; returns whether it is now flagged.
    ///
    /// Ids outside the catalog are ignored.
    pub fn toggle_flag(&mut self, id: QuestionId) -> bool {
        if !self.catalog.contains(id) {
            return false;
        }
        if self.flagged.remove(&id) {
            false
        } else {
            self.flagged.insert(id);
            true
        }
    }

    pub fn toggle_current_flag(&mut self) -> bool {
        match self.current_question().map(|q| q.id()) {
            Some(id) => self.toggle_flag(id),
            None => false,
        }
    }

    pub fn stop_and_review(&mut self) {
        if !self.questions.is_empty() {
            self.view = View::Review;
        }
    }

    pub fn resume_quiz(&mut self) {
        if !self.questions.is_empty() {
            self.view = View::Quiz;
        }
    }

    // ─── accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Arc<Question>> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn selection(&self) -> &[OptionId] {
        &self.selection
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Result of the last check; meaningful only while [`Self::is_checked`].
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.correct
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered_count
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    #[must_use]
    pub fn status_of(&self, id: QuestionId) -> Option<QuestionStatus> {
        self.status.get(&id).copied()
    }

    #[must_use]
    pub fn status_map(&self) -> &BTreeMap<QuestionId, QuestionStatus> {
        &self.status
    }

    #[must_use]
    pub fn wrong_answers(&self) -> &[WrongAnswer] {
        &self.wrong_answers
    }

    #[must_use]
    pub fn flagged(&self) -> &BTreeSet<QuestionId> {
        &self.flagged
    }

    #[must_use]
    pub fn is_flagged(&self, id: QuestionId) -> bool {
        self.flagged.contains(&id)
    }

    #[must_use]
    pub fn is_cleared(&self, id: QuestionId) -> bool {
        self.cleared.contains(&id)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("view", &self.view)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("checked", &self.checked)
            .field("answered", &self.answered_count)
            .field("correct", &self.correct_count)
            .field("wrong", &self.wrong_count)
            .field("flagged_len", &self.flagged.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
