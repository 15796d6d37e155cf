use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

/// Grouping label for questions that carry no category. Never persisted.
pub const UNCATEGORIZED: &str = "Uncategorized";

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Exam domain a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Cloud Concepts")]
    CloudConcepts,
    #[serde(rename = "Security and Compliance")]
    SecurityAndCompliance,
    #[serde(rename = "Cloud Technology and Services")]
    CloudTechnologyAndServices,
    #[serde(rename = "Billing, Pricing, and Support")]
    BillingPricingAndSupport,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::CloudConcepts,
        Category::SecurityAndCompliance,
        Category::CloudTechnologyAndServices,
        Category::BillingPricingAndSupport,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::CloudConcepts => "Cloud Concepts",
            Category::SecurityAndCompliance => "Security and Compliance",
            Category::CloudTechnologyAndServices => "Cloud Technology and Services",
            Category::BillingPricingAndSupport => "Billing, Pricing, and Support",
        }
    }

    /// Case-insensitive lookup by label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Label used for grouping, falling back to [`UNCATEGORIZED`].
    #[must_use]
    pub fn group_label(category: Option<Category>) -> &'static str {
        category.map_or(UNCATEGORIZED, Category::label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── ANSWER TYPES ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Exactly one option is correct; selecting replaces the selection.
    Single,
    /// One or more options are correct; selecting toggles membership.
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

/// Outcome recorded for a question once it has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Correct,
    Wrong,
}

impl QuestionStatus {
    #[must_use]
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Wrong }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,
    #[error("question has no options")]
    NoOptions,
    #[error("duplicate option id {0}")]
    DuplicateOption(OptionId),
    #[error("question has no correct answers")]
    NoCorrectAnswers,
    #[error("correct answer {0} is not one of the options")]
    UnknownCorrectAnswer(OptionId),
    #[error("single-answer question lists {0} correct answers")]
    SingleWithMany(usize),
}

/// Wire shape of a catalog entry, validated into a [`Question`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionDraft {
    pub id: QuestionId,
    #[serde(default)]
    pub category: Option<Category>,
    pub question: String,
    #[serde(rename = "type")]
    pub mode: AnswerMode,
    pub options: Vec<AnswerOption>,
    pub correct_answers: Vec<OptionId>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    pub(crate) fn validate(self) -> Result<Question, QuestionError> {
        Question::new(
            self.id,
            self.category,
            self.question,
            self.mode,
            self.options,
            self.correct_answers,
            self.explanation,
        )
    }
}

/// Immutable multiple-choice question from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category: Option<Category>,
    prompt: String,
    mode: AnswerMode,
    options: Vec<AnswerOption>,
    correct_answers: Vec<OptionId>,
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, options are missing or
    /// duplicated, or the correct-answer set is empty, unknown, or too large for
    /// a single-answer question.
    pub fn new(
        id: QuestionId,
        category: Option<Category>,
        prompt: impl Into<String>,
        mode: AnswerMode,
        options: Vec<AnswerOption>,
        correct_answers: Vec<OptionId>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut option_ids = HashSet::with_capacity(options.len());
        for option in &options {
            if !option_ids.insert(&option.id) {
                return Err(QuestionError::DuplicateOption(option.id.clone()));
            }
        }

        let mut correct: Vec<OptionId> = Vec::with_capacity(correct_answers.len());
        for answer in correct_answers {
            if !option_ids.contains(&answer) {
                return Err(QuestionError::UnknownCorrectAnswer(answer));
            }
            if !correct.contains(&answer) {
                correct.push(answer);
            }
        }
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswers);
        }
        if mode == AnswerMode::Single && correct.len() != 1 {
            return Err(QuestionError::SingleWithMany(correct.len()));
        }

        let explanation = explanation.filter(|text| !text.trim().is_empty());

        Ok(Self {
            id,
            category,
            prompt,
            mode,
            options,
            correct_answers: correct,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Category label used for grouping and navigation.
    #[must_use]
    pub fn group_label(&self) -> &'static str {
        Category::group_label(self.category)
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, id: &OptionId) -> bool {
        self.options.iter().any(|o| &o.id == id)
    }

    #[must_use]
    pub fn correct_answers(&self) -> &[OptionId] {
        &self.correct_answers
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Exact-match grading: same cardinality and every selected id is correct.
    ///
    /// An empty selection is never correct.
    #[must_use]
    pub fn is_correct(&self, selection: &[OptionId]) -> bool {
        !selection.is_empty()
            && selection.len() == self.correct_answers.len()
            && selection.iter().all(|id| self.correct_answers.contains(id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
