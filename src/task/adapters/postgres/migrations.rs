//! Embedded schema migrations for the task board.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::result::QueryResult;

/// SQL creating the `tasks` table and its partition index.
pub const CREATE_TASKS_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_tasks/up.sql");

/// Applies every embedded migration. Safe to run repeatedly.
///
/// # Errors
///
/// Returns the Diesel error raised by the first failing statement.
pub fn apply_migrations(connection: &mut PgConnection) -> QueryResult<()> {
    connection.batch_execute(CREATE_TASKS_SQL)
}
