//! Repository port for task persistence and position maintenance.

use crate::task::domain::{Column, NewTask, ProjectId, Task, TaskEdit, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Move instruction handed to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskRequest {
    /// Task being moved.
    pub task_id: TaskId,
    /// Destination column.
    pub column: Column,
    /// Requested order; clamped against the destination partition.
    pub order: i64,
    /// Timestamp recorded on the moved task.
    pub moved_at: DateTime<Utc>,
}

/// Edit instruction handed to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTaskRequest {
    /// Task being edited.
    pub task_id: TaskId,
    /// Field changes, including an optional destination column.
    pub edit: TaskEdit,
    /// Timestamp recorded on the edited task.
    pub edited_at: DateTime<Utc>,
}

/// Task persistence contract.
///
/// Every mutating method is one atomic unit: readers never observe a
/// partition with some siblings shifted and others not.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task at the end of its partition and returns it with its
    /// assigned position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn append(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Applies detail changes and, when the column differs, appends the task
    /// to the end of the new column, all in one atomic unit.
    ///
    /// Either every change is stored or none is.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::ConflictAborted`] when a concurrent writer
    /// prevented the commit.
    async fn edit_task(&self, request: EditTaskRequest) -> TaskRepositoryResult<Task>;

    /// Relocates a task and shifts the siblings in its source and destination
    /// partitions.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::ConflictAborted`] when a concurrent writer
    /// prevented the commit.
    async fn move_task(&self, request: MoveTaskRequest) -> TaskRepositoryResult<Task>;

    /// Deletes a task and closes the gap it leaves, returning the removed task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns all tasks of a project ordered by position ascending, then
    /// newest first, then by identifier.
    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A concurrent modification prevented the transaction from committing.
    #[error("transaction aborted by a concurrent modification: {0}")]
    ConflictAborted(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Wraps an error raised by a conflicting concurrent transaction.
    pub fn conflict(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ConflictAborted(Arc::new(err))
    }
}
