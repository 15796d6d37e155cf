//! Shared error types for the services crate.

use thiserror::Error;

/// Errors emitted by the quiz session.
///
/// Invalid user actions (checking an empty selection, selecting while checked)
/// are silent no-ops and never surface here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
}
