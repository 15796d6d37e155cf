use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Category, Question, QuestionDraft, QuestionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("question {id} is invalid: {source}")]
    InvalidQuestion {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
}

/// Read-only question registry, built once at startup and shared by `Arc`.
///
/// Keeps questions in load order plus an id index for snapshot reconstruction.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: Vec<Arc<Question>>,
    index: HashMap<QuestionId, usize>,
}

impl Catalog {
    /// Build a catalog from already-validated questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(questions.len());
        let mut stored = Vec::with_capacity(questions.len());
        for question in questions {
            if index.insert(question.id(), stored.len()).is_some() {
                return Err(CatalogError::DuplicateId(question.id()));
            }
            stored.push(Arc::new(question));
        }
        Ok(Self {
            questions: stored,
            index,
        })
    }

    /// Parse a JSON array of questions (`id`, `category`, `question`, `type`,
    /// `options`, `correctAnswers`, `explanation`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for malformed JSON, invalid questions, or duplicate ids.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(raw)?;
        let questions = drafts
            .into_iter()
            .map(|draft| {
                let id = draft.id;
                draft
                    .validate()
                    .map_err(|source| CatalogError::InvalidQuestion { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Arc<Question>> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions whose category matches, `None` selecting the uncategorized ones.
    #[must_use]
    pub fn in_category(&self, category: Option<Category>) -> Vec<Arc<Question>> {
        self.questions
            .iter()
            .filter(|q| q.category() == category)
            .cloned()
            .collect()
    }
}
