mod plan;
mod progress;
mod restore;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{grouped_shuffle, shuffle};
pub use progress::{CategoryProgress, QuestionListItem, SessionProgress};
pub use service::{Evaluation, QuizSession, View, WrongAnswer};
pub use workflow::{QuizWorkflow, SnapshotWriter};
