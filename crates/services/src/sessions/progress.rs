use std::collections::BTreeMap;

use quiz_core::model::{QuestionId, QuestionStatus};

use super::service::QuizSession;

/// Aggregate numbers for the header and review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub answered: u32,
    pub correct: u32,
    pub wrong: u32,
    pub total_questions: usize,
    pub working_set_len: usize,
    /// Rounded percentage of answered questions that are correct; 0 before any answer.
    pub accuracy_percent: u32,
    pub all_answered: bool,
}

/// One row in the question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionListItem {
    /// Position in the working set (the `jump_to` target).
    pub index: usize,
    pub question_id: QuestionId,
    pub status: Option<QuestionStatus>,
    pub flagged: bool,
    pub is_current: bool,
}

/// Working-set questions of one category, in working-set order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProgress {
    pub label: &'static str,
    pub items: Vec<QuestionListItem>,
    pub correct: u32,
    pub wrong: u32,
}

impl CategoryProgress {
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }
}

fn accuracy_percent(correct: u32, answered: u32) -> u32 {
    if answered == 0 {
        return 0;
    }
    let (correct, answered) = (u64::from(correct), u64::from(answered));
    // round half up
    u32::try_from((correct * 200 + answered) / (answered * 2)).unwrap_or(100)
}

impl QuizSession {
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total_questions = self.catalog.len();
        SessionProgress {
            answered: self.answered_count,
            correct: self.correct_count,
            wrong: self.wrong_count,
            total_questions,
            working_set_len: self.questions.len(),
            accuracy_percent: accuracy_percent(self.correct_count, self.answered_count),
            all_answered: total_questions > 0
                && usize::try_from(self.answered_count).is_ok_and(|a| a >= total_questions),
        }
    }

    /// Working set as list rows.
    #[must_use]
    pub fn question_list(&self) -> Vec<QuestionListItem> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let id = question.id();
                QuestionListItem {
                    index,
                    question_id: id,
                    status: self.status.get(&id).copied(),
                    flagged: self.flagged.contains(&id),
                    is_current: index == self.current,
                }
            })
            .collect()
    }

    /// Working set grouped by category label, labels in ascending order.
    #[must_use]
    pub fn category_breakdown(&self) -> Vec<CategoryProgress> {
        let mut groups: BTreeMap<&'static str, CategoryProgress> = BTreeMap::new();
        for (item, question) in self.question_list().into_iter().zip(&self.questions) {
            let label = question.group_label();
            let group = groups.entry(label).or_insert_with(|| CategoryProgress {
                label,
                items: Vec::new(),
                correct: 0,
                wrong: 0,
            });
            match item.status {
                Some(QuestionStatus::Correct) => group.correct += 1,
                Some(QuestionStatus::Wrong) => group.wrong += 1,
                None => {}
            }
            group.items.push(item);
        }
        groups.into_values().collect()
    }
}
