mod catalog;
mod ids;
mod question;
mod snapshot;

pub use catalog::{Catalog, CatalogError};
pub use ids::{OptionId, ParseIdError, QuestionId, UserIdentity};
pub use question::{
    AnswerMode, AnswerOption, Category, Question, QuestionError, QuestionStatus, UNCATEGORIZED,
};
pub use snapshot::{SessionSnapshot, SnapshotError, WrongAnswerRecord};
