//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or parsing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the persisted column width.
    #[error("task title is {0} characters long, at most 255 are allowed")]
    TitleTooLong(usize),

    /// The status value is not one of the board columns.
    #[error("unknown task status '{0}', expected todo, in-progress, or done")]
    UnknownStatus(String),

    /// A position value cannot be represented as a dense index.
    #[error("task order {0} is out of range")]
    PositionOutOfRange(i64),

    /// A task identifier could not be parsed.
    #[error("invalid task identifier '{0}'")]
    InvalidTaskId(String),
}
