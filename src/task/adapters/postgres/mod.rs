//! `PostgreSQL` adapters for task board persistence.

mod migrations;
mod models;
mod repository;
mod schema;

pub use migrations::{CREATE_TASKS_SQL, apply_migrations};
pub use repository::{PostgresTaskRepository, TaskPgPool};
