//! Service layer for creating, moving, editing, and deleting board tasks.

use super::commands::{CreateTaskRequest, MoveTaskCommand, UpdateTaskRequest};
use crate::task::{
    domain::{ProjectId, Task, TaskDomainError, TaskId},
    ports::{EditTaskRequest, MoveTaskRequest, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Service-level errors for task board operations.
#[derive(Debug, Error)]
pub enum TaskBoardError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl TaskBoardError {
    /// Returns `true` when the referenced task does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository(TaskRepositoryError::NotFound(_)))
    }

    /// Returns `true` when the input was rejected before reaching storage.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Returns `true` when a concurrent writer aborted the operation; the
    /// caller may retry.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Repository(TaskRepositoryError::ConflictAborted(_))
        )
    }
}

/// Result type for task board service operations.
pub type TaskBoardResult<T> = Result<T, TaskBoardError>;

/// Task board orchestration service.
pub struct TaskBoardService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for TaskBoardService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> TaskBoardService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task board service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Appends a new task to the end of its column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Domain`] when the title is blank, or
    /// [`TaskBoardError::Repository`] when persistence fails.
    #[instrument(skip(self, request), fields(project_id = %request.project_id()))]
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskBoardResult<Task> {
        let draft = request.into_new_task(&*self.clock)?;
        let task = self.repository.append(draft).await?;
        info!(task_id = %task.id(), position = %task.position(), "task created");
        Ok(task)
    }

    /// Moves a task to a position, possibly in another column.
    ///
    /// The requested order is clamped to the destination column's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Repository`] wrapping
    /// [`TaskRepositoryError::NotFound`] for unknown tasks or
    /// [`TaskRepositoryError::ConflictAborted`] when a concurrent writer won.
    #[instrument(skip(self), fields(task_id = %command.task_id()))]
    pub async fn move_task(&self, command: MoveTaskCommand) -> TaskBoardResult<Task> {
        let request = MoveTaskRequest {
            task_id: command.task_id(),
            column: command.status(),
            order: command.order(),
            moved_at: self.clock.utc(),
        };
        let moved = self
            .repository
            .move_task(request)
            .await
            .inspect_err(|err| warn_on_conflict(err, "task move"))?;
        debug!(
            status = ?moved.status(),
            position = %moved.position(),
            "task moved"
        );
        Ok(moved)
    }

    /// Edits a task's details; a status change appends it to the new column.
    ///
    /// The details and the relocation are stored together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Domain`] for a blank title or
    /// [`TaskBoardError::Repository`] when the task does not exist or a
    /// concurrent writer aborted the edit.
    #[instrument(skip(self, request), fields(task_id = %request.task_id()))]
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskBoardResult<Task> {
        let task_id = request.task_id();
        let edit = request.into_edit()?;
        let request = EditTaskRequest {
            task_id,
            edit,
            edited_at: self.clock.utc(),
        };
        let edited = self
            .repository
            .edit_task(request)
            .await
            .inspect_err(|err| warn_on_conflict(err, "task edit"))?;
        debug!(
            status = ?edited.status(),
            position = %edited.position(),
            "task edited"
        );
        Ok(edited)
    }

    /// Deletes a task and closes the gap in its column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Repository`] wrapping
    /// [`TaskRepositoryError::NotFound`] for unknown tasks.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: TaskId) -> TaskBoardResult<Task> {
        let removed = self.repository.delete(task_id).await?;
        info!(position = %removed.position(), "task deleted");
        Ok(removed)
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Repository`] when persistence lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskBoardResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Lists a project's tasks in board order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Repository`] when persistence lookup fails.
    pub async fn list_project_tasks(&self, project_id: ProjectId) -> TaskBoardResult<Vec<Task>> {
        Ok(self.repository.list_by_project(project_id).await?)
    }
}

fn warn_on_conflict(err: &TaskRepositoryError, operation: &str) {
    if matches!(err, TaskRepositoryError::ConflictAborted(_)) {
        warn!(error = %err, operation, "aborted by a concurrent modification");
    }
}
