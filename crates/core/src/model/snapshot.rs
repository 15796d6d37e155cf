use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::QuestionStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot is malformed: {0}")]
    Malformed(String),

    #[error("answered count ({answered}) does not match correct + wrong ({sum})")]
    CountMismatch { answered: u32, sum: u64 },

    #[error("answered count ({answered}) exceeds the {statuses} status entries")]
    TallyExceedsStatuses { answered: u32, statuses: usize },

    #[error("wrong-answer log does not match the questions marked wrong")]
    WrongLogMismatch,
}

/// A wrong answer as persisted: the question id and the options chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswerRecord {
    pub question_id: QuestionId,
    pub selected_answers: Vec<OptionId>,
}

/// Serializable projection of a quiz session.
///
/// Field names follow the persisted document layout shared by the local and
/// remote stores. Question payloads are never stored, only ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub question_order: Vec<QuestionId>,
    pub current_index: usize,
    pub answered_count: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    #[serde(default)]
    pub question_status_map: BTreeMap<QuestionId, QuestionStatus>,
    #[serde(default)]
    pub wrong_answers: Vec<WrongAnswerRecord>,
    #[serde(default)]
    pub flagged_questions: Vec<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Check the invariants of a deserialized snapshot.
    ///
    /// # Errors
    ///
    /// - `SnapshotError::CountMismatch` if `answered != correct + wrong`.
    /// - `SnapshotError::TallyExceedsStatuses` if more questions are counted
    ///   as answered than have a status.
    /// - `SnapshotError::WrongLogMismatch` if the wrong-answer log and the
    ///   questions marked wrong are not the same set.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let sum = u64::from(self.correct_count) + u64::from(self.wrong_count);
        if u64::from(self.answered_count) != sum {
            return Err(SnapshotError::CountMismatch {
                answered: self.answered_count,
                sum,
            });
        }

        let statuses = self.question_status_map.len();
        if usize::try_from(self.answered_count).map_or(true, |answered| answered > statuses) {
            return Err(SnapshotError::TallyExceedsStatuses {
                answered: self.answered_count,
                statuses,
            });
        }

        let marked_wrong: BTreeSet<_> = self
            .question_status_map
            .iter()
            .filter(|(_, status)| **status == QuestionStatus::Wrong)
            .map(|(id, _)| *id)
            .collect();
        let logged: BTreeSet<_> = self.wrong_answers.iter().map(|r| r.question_id).collect();
        if marked_wrong != logged {
            return Err(SnapshotError::WrongLogMismatch);
        }
        Ok(())
    }

    /// Serialize to the JSON document stored by the backends.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error; not expected for well-formed snapshots.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and validate a stored JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Malformed` when the document is not a snapshot,
    /// or the error from [`SessionSnapshot::validate`] when it is inconsistent.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)
            .map_err(|err| SnapshotError::Malformed(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Same as [`SessionSnapshot::from_json`] for an already-parsed document.
    ///
    /// # Errors
    ///
    /// See [`SessionSnapshot::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_value(value)
            .map_err(|err| SnapshotError::Malformed(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
