//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Board column, `None` for the backlog.
    pub status: Option<String>,
    /// Position within the partition.
    pub position: i32,
    /// Optional assigned member.
    pub assigned_to_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Board column, `None` for the backlog.
    pub status: Option<&'static str>,
    /// Position within the partition.
    pub position: i32,
    /// Optional assigned member.
    pub assigned_to_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by a task edit.
///
/// Every column is written; `None` values clear the stored field.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskEditChangeset {
    /// New title.
    pub title: String,
    /// New description; `None` clears it.
    pub description: Option<String>,
    /// Board column, `None` for the backlog.
    pub status: Option<&'static str>,
    /// Position within the partition.
    pub position: i32,
    /// New assignee; `None` clears it.
    pub assigned_to_id: Option<uuid::Uuid>,
    /// Modification timestamp.
    pub updated_at: DateTime<Utc>,
}
