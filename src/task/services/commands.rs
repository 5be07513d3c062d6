//! Typed commands accepted by the task board service.
//!
//! Request bodies arrive as loosely typed JSON; they are parsed once into
//! these commands so illegal statuses and blank titles never reach the
//! repository.

use crate::task::domain::{
    Column, MemberId, NewTask, ProjectId, TaskDomainError, TaskEdit, TaskId, TaskStatus, TaskTitle,
    normalize_description,
};
use mockable::Clock;
use serde::Deserialize;

/// Request payload for appending a task to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    status: Column,
    title: String,
    description: Option<String>,
    assigned_to_id: Option<MemberId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, status: Column, title: impl Into<String>) -> Self {
        Self {
            project_id,
            status,
            title: title.into(),
            description: None,
            assigned_to_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, member: MemberId) -> Self {
        self.assigned_to_id = Some(member);
        self
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the target column.
    #[must_use]
    pub const fn status(&self) -> Column {
        self.status
    }

    pub(super) fn into_new_task(self, clock: &impl Clock) -> Result<NewTask, TaskDomainError> {
        let title = TaskTitle::new(self.title)?;
        Ok(NewTask::new(self.project_id, self.status, title, clock)
            .with_description(normalize_description(self.description))
            .with_assignee(self.assigned_to_id))
    }
}

/// JSON body for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    /// Owning project.
    pub project_id: ProjectId,
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Column; absent or `null` places the task in the backlog.
    #[serde(default)]
    pub status: Option<String>,
    /// Optional assignee.
    #[serde(default)]
    pub assigned_to_id: Option<MemberId>,
}

impl TryFrom<CreateTaskBody> for CreateTaskRequest {
    type Error = TaskDomainError;

    fn try_from(body: CreateTaskBody) -> Result<Self, Self::Error> {
        let status = TaskStatus::parse_column(body.status.as_deref())?;
        let mut request = Self::new(body.project_id, status, body.title);
        request.description = body.description;
        request.assigned_to_id = body.assigned_to_id;
        Ok(request)
    }
}

/// JSON body for the move endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoveTaskBody {
    /// Destination column; `null` moves the task to the backlog.
    #[serde(default)]
    pub status: Option<String>,
    /// Requested position within the destination column.
    pub order: i64,
}

/// Validated move instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskCommand {
    task_id: TaskId,
    status: Column,
    order: i64,
}

impl MoveTaskCommand {
    /// Creates a command from already-typed values.
    #[must_use]
    pub const fn new(task_id: TaskId, status: Column, order: i64) -> Self {
        Self {
            task_id,
            status,
            order,
        }
    }

    /// Parses a path identifier and JSON body into a command.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskId`] when the identifier is not a
    /// UUID and [`TaskDomainError::UnknownStatus`] when the status is not a
    /// board column.
    pub fn parse(task_id: &str, body: &MoveTaskBody) -> Result<Self, TaskDomainError> {
        let id = task_id
            .parse::<TaskId>()
            .map_err(|_| TaskDomainError::InvalidTaskId(task_id.to_owned()))?;
        let status = TaskStatus::parse_column(body.status.as_deref())?;
        Ok(Self::new(id, status, body.order))
    }

    /// Returns the task to move.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the destination column.
    #[must_use]
    pub const fn status(&self) -> Column {
        self.status
    }

    /// Returns the requested, unclamped order.
    #[must_use]
    pub const fn order(&self) -> i64 {
        self.order
    }
}

/// Partial edit of a task.
///
/// Nested options distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    title: Option<String>,
    description: Option<Option<String>>,
    assigned_to_id: Option<Option<MemberId>>,
    status: Option<Column>,
}

impl UpdateTaskRequest {
    /// Creates an edit that changes nothing yet.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            title: None,
            description: None,
            assigned_to_id: None,
            status: None,
        }
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces or clears the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replaces or clears the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, member: Option<MemberId>) -> Self {
        self.assigned_to_id = Some(member);
        self
    }

    /// Moves the task to the end of another column.
    #[must_use]
    pub const fn with_status(mut self, status: Column) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the task being edited.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Validates the request into a domain edit.
    pub(super) fn into_edit(self) -> Result<TaskEdit, TaskDomainError> {
        Ok(TaskEdit {
            title: self.title.map(TaskTitle::new).transpose()?,
            description: self.description.map(normalize_description),
            assigned_to_id: self.assigned_to_id,
            column: self.status,
        })
    }
}
