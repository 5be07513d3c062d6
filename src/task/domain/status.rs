//! Board column identifiers.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kanban column a task can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Work that has not started.
    #[serde(rename = "todo")]
    Todo,
    /// Work that is underway.
    #[serde(rename = "in-progress")]
    InProgress,
    /// Finished work.
    #[serde(rename = "done")]
    Done,
}

/// Column of a task; `None` is the unassigned backlog.
pub type Column = Option<TaskStatus>;

impl TaskStatus {
    /// All board columns in display order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Parses an optional status string into a column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStatus`] when a present value is not
    /// a board column.
    pub fn parse_column(value: Option<&str>) -> Result<Column, TaskDomainError> {
        value.map(Self::try_from).transpose()
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(TaskDomainError::UnknownStatus(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
