//! Task aggregate and the draft used to append new tasks.

use super::{Column, MemberId, Partition, Position, ProjectId, TaskId, TaskTitle};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    status: Column,
    #[serde(rename = "order")]
    position: Position,
    project_id: ProjectId,
    assigned_to_id: Option<MemberId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted column.
    pub status: Column,
    /// Persisted position within the partition.
    pub position: Position,
    /// Owning project.
    pub project_id: ProjectId,
    /// Assigned member, if any.
    pub assigned_to_id: Option<MemberId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            position: data.position,
            project_id: data.project_id,
            assigned_to_id: data.assigned_to_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the column, `None` for the backlog.
    #[must_use]
    pub const fn status(&self) -> Column {
        self.status
    }

    /// Returns the dense position within the partition.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the assigned member, if any.
    #[must_use]
    pub const fn assigned_to_id(&self) -> Option<MemberId> {
        self.assigned_to_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the partition this task belongs to.
    #[must_use]
    pub const fn partition(&self) -> Partition {
        Partition::new(self.project_id, self.status)
    }

    /// Board listing order: position ascending, newest first, then by id.
    #[must_use]
    pub fn board_cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Applies the detail fields of an edit, stamping `at` when any changed.
    ///
    /// The edit's column is ignored here; relocation goes through the
    /// reordering planner so siblings stay dense.
    pub fn apply_details(&mut self, edit: &TaskEdit, at: DateTime<Utc>) {
        if let Some(title) = &edit.title {
            self.title = title.clone();
        }
        if let Some(description) = &edit.description {
            self.description.clone_from(description);
        }
        if let Some(member) = edit.assigned_to_id {
            self.assigned_to_id = member;
        }
        if edit.changes_details() {
            self.updated_at = at;
        }
    }

    /// Places the task at a new column and position.
    ///
    /// Callers are responsible for shifting siblings so the affected
    /// partitions stay dense.
    pub const fn relocate(&mut self, column: Column, position: Position, at: DateTime<Utc>) {
        self.status = column;
        self.position = position;
        self.updated_at = at;
    }

    /// Moves a sibling by one slot as part of another task's move.
    ///
    /// Sibling shifts leave `updated_at` untouched.
    pub const fn shift_to(&mut self, position: Position) {
        self.position = position;
    }
}

/// Changes requested for an existing task.
///
/// Outer `None` leaves a field alone; for the optional fields `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Replacement description.
    pub description: Option<Option<String>>,
    /// Replacement assignee.
    pub assigned_to_id: Option<Option<MemberId>>,
    /// Column to append the task to.
    pub column: Option<Column>,
}

impl TaskEdit {
    /// Returns `true` when a title, description, or assignee is supplied.
    #[must_use]
    pub const fn changes_details(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.assigned_to_id.is_some()
    }

    /// Returns the destination column when it differs from the task's own.
    #[must_use]
    pub fn relocation(&self, task: &Task) -> Option<Column> {
        self.column.filter(|column| *column != task.status())
    }
}

/// A task that has not yet been given a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    id: TaskId,
    project_id: ProjectId,
    status: Column,
    title: TaskTitle,
    description: Option<String>,
    assigned_to_id: Option<MemberId>,
    created_at: DateTime<Utc>,
}

impl NewTask {
    /// Creates a draft for the given partition.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        status: Column,
        title: TaskTitle,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TaskId::new(),
            project_id,
            status,
            title,
            description: None,
            assigned_to_id: None,
            created_at: clock.utc(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, member: Option<MemberId>) -> Self {
        self.assigned_to_id = member;
        self
    }

    /// Returns the identifier the task will be stored under.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the partition the task is appended to.
    #[must_use]
    pub const fn partition(&self) -> Partition {
        Partition::new(self.project_id, self.status)
    }

    /// Finalizes the draft at the end of a partition holding `count` tasks.
    #[must_use]
    pub fn append_after(self, count: u32) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            position: Position::new(count),
            project_id: self.project_id,
            assigned_to_id: self.assigned_to_id,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
