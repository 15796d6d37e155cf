#![forbid(unsafe_code)]

pub mod availability;
pub mod error;
pub mod persistence;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use availability::{CheckTicket, IdentityState, SavedSessionCheck, SavedSessionStatus};
pub use error::SessionError;
pub use persistence::{SessionPersistence, resolve_resume};
pub use sessions::{
    CategoryProgress, Evaluation, QuestionListItem, QuizSession, QuizWorkflow, SessionProgress,
    SnapshotWriter, View, WrongAnswer,
};
