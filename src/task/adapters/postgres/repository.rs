//! `PostgreSQL` repository implementation for task board storage.
//!
//! Each mutating call runs in one transaction that first takes a
//! transaction-scoped advisory lock on the task's project. Concurrent
//! operations on the same project therefore serialize, and the count, shift,
//! and task writes of one call are never interleaved with another's.

use super::{
    models::{NewTaskRow, TaskEditChangeset, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{
        Column, NewTask, Partition, PersistedTaskData, Position, ProjectId, Shift, Task, TaskId,
        TaskStatus, TaskTitle, plan_move, plan_removal,
    },
    ports::{
        EditTaskRequest, MoveTaskRequest, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::expression_methods::PgExpressionMethods;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &TaskPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn run_transaction<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |conn| conn.transaction::<T, TaskRepositoryError, _>(f)).await
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::conflict(err)
            }
            // Diesel reports SQLSTATE 40P01 as an unknown kind.
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, ref info)
                if info.message().starts_with("deadlock detected") =>
            {
                Self::conflict(err)
            }
            _ => Self::persistence(err),
        }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn append(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let task_id = task.id();
        let partition = task.partition();

        self.run_transaction(move |connection| {
            lock_project(connection, partition.project_id())?;
            let count = count_in_partition(connection, partition, None)?;
            let stored = task.append_after(count);

            diesel::insert_into(tasks::table)
                .values(&to_new_row(&stored)?)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    other => TaskRepositoryError::from(other),
                })?;

            Ok(stored)
        })
        .await
    }

    async fn edit_task(&self, request: EditTaskRequest) -> TaskRepositoryResult<Task> {
        self.run_transaction(move |connection| {
            let current = lock_task(connection, request.task_id)?;
            let mut edited = current.clone();
            edited.apply_details(&request.edit, request.edited_at);

            if let Some(column) = request.edit.relocation(&current) {
                let destination = Partition::new(current.project_id(), column);
                let others = count_in_partition(connection, destination, Some(current.id()))?;
                let plan = plan_move(&current, column, i64::MAX, others);
                debug!(
                    task_id = %current.id(),
                    position = %plan.position(),
                    "planned task append for an edit"
                );
                for shift in plan.shifts() {
                    apply_shift(connection, current.project_id(), shift, current.id())?;
                }
                edited.relocate(plan.column(), plan.position(), request.edited_at);
            }

            diesel::update(tasks::table.find(edited.id().into_inner()))
                .set(&to_edit_changeset(&edited)?)
                .execute(connection)?;
            Ok(edited)
        })
        .await
    }

    async fn move_task(&self, request: MoveTaskRequest) -> TaskRepositoryResult<Task> {
        self.run_transaction(move |connection| {
            let current = lock_task(connection, request.task_id)?;
            let destination = Partition::new(current.project_id(), request.column);
            let others = count_in_partition(connection, destination, Some(current.id()))?;
            let plan = plan_move(&current, request.column, request.order, others);
            debug!(
                task_id = %current.id(),
                requested = request.order,
                position = %plan.position(),
                "planned task move"
            );

            if plan.is_noop() {
                return Ok(current);
            }

            for shift in plan.shifts() {
                apply_shift(connection, current.project_id(), shift, current.id())?;
            }

            let mut moved = current;
            moved.relocate(plan.column(), plan.position(), request.moved_at);
            diesel::update(tasks::table.find(moved.id().into_inner()))
                .set((
                    tasks::status.eq(column_to_storage(moved.status())),
                    tasks::position.eq(position_to_storage(moved.position())?),
                    tasks::updated_at.eq(moved.updated_at()),
                ))
                .execute(connection)?;
            Ok(moved)
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        self.run_transaction(move |connection| {
            let removed = lock_task(connection, id)?;
            diesel::delete(tasks::table.find(id.into_inner())).execute(connection)?;
            apply_shift(
                connection,
                removed.project_id(),
                &plan_removal(&removed),
                removed.id(),
            )?;
            Ok(removed)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .order_by((
                    tasks::position.asc(),
                    tasks::created_at.desc(),
                    tasks::id.asc(),
                ))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

/// Serializes writers on one project until the surrounding transaction ends.
fn lock_project(connection: &mut PgConnection, project_id: ProjectId) -> TaskRepositoryResult<()> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind::<diesel::sql_types::Uuid, _>(project_id.into_inner())
        .execute(connection)?;
    Ok(())
}

/// Locks the task's project, then re-reads the task row under `FOR UPDATE`.
///
/// The second read observes any move committed while this transaction waited
/// for the project lock.
fn lock_task(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<Task> {
    let project_id = tasks::table
        .find(id.into_inner())
        .select(tasks::project_id)
        .first::<uuid::Uuid>(connection)
        .optional()?
        .ok_or(TaskRepositoryError::NotFound(id))?;
    lock_project(connection, ProjectId::from_uuid(project_id))?;

    let row = tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()?
        .ok_or(TaskRepositoryError::NotFound(id))?;
    row_to_task(row)
}

fn count_in_partition(
    connection: &mut PgConnection,
    partition: Partition,
    excluding: Option<TaskId>,
) -> TaskRepositoryResult<u32> {
    let mut query = tasks::table
        .filter(tasks::project_id.eq(partition.project_id().into_inner()))
        .filter(tasks::status.is_not_distinct_from(column_to_storage(partition.column())))
        .into_boxed();
    if let Some(excluded) = excluding {
        query = query.filter(tasks::id.ne(excluded.into_inner()));
    }
    let count = query.count().get_result::<i64>(connection)?;
    u32::try_from(count).map_err(TaskRepositoryError::persistence)
}

fn apply_shift(
    connection: &mut PgConnection,
    project_id: ProjectId,
    shift: &Shift,
    moved: TaskId,
) -> TaskRepositoryResult<usize> {
    let from = position_to_storage(shift.from())?;
    let delta = shift.direction().delta();
    let siblings = tasks::table
        .filter(tasks::project_id.eq(project_id.into_inner()))
        .filter(tasks::status.is_not_distinct_from(column_to_storage(shift.column())))
        .filter(tasks::id.ne(moved.into_inner()))
        .filter(tasks::position.ge(from));

    let shifted = match shift.through() {
        Some(upper) => {
            let through = position_to_storage(upper)?;
            diesel::update(siblings.filter(tasks::position.le(through)))
                .set(tasks::position.eq(tasks::position + delta))
                .execute(connection)?
        }
        None => diesel::update(siblings)
            .set(tasks::position.eq(tasks::position + delta))
            .execute(connection)?,
    };
    Ok(shifted)
}

fn column_to_storage(column: Column) -> Option<&'static str> {
    column.map(TaskStatus::as_str)
}

fn position_to_storage(position: Position) -> TaskRepositoryResult<i32> {
    i32::try_from(position.value()).map_err(TaskRepositoryError::persistence)
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: column_to_storage(task.status()),
        position: position_to_storage(task.position())?,
        assigned_to_id: task.assigned_to_id().map(|member| member.into_inner()),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_edit_changeset(task: &Task) -> TaskRepositoryResult<TaskEditChangeset> {
    Ok(TaskEditChangeset {
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: column_to_storage(task.status()),
        position: position_to_storage(task.position())?,
        assigned_to_id: task.assigned_to_id().map(|member| member.into_inner()),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        project_id,
        title: persisted_title,
        description,
        status: persisted_status,
        position: persisted_position,
        assigned_to_id,
        created_at,
        updated_at,
    } = row;

    let title = TaskTitle::new(persisted_title).map_err(TaskRepositoryError::persistence)?;
    let status = TaskStatus::parse_column(persisted_status.as_deref())
        .map_err(TaskRepositoryError::persistence)?;
    let position =
        Position::try_from(persisted_position).map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        status,
        position,
        project_id: ProjectId::from_uuid(project_id),
        assigned_to_id: assigned_to_id.map(Into::into),
        created_at,
        updated_at,
    }))
}
