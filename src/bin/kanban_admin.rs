//! Operator CLI for the task board store.
//!
//! ```text
//! kanban_admin migrate
//! kanban_admin list --project <uuid>
//! kanban_admin create --project <uuid> --title "Write docs" [--status todo]
//! kanban_admin move --task <uuid> --status in-progress --order 0
//! kanban_admin delete --task <uuid>
//! ```
//!
//! Connection settings come from global flags or their environment variables
//! (see [`DatabaseArgs`]).
//! Results are written to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use kanban::config::DatabaseArgs;
use kanban::task::{
    adapters::postgres::{PostgresTaskRepository, apply_migrations},
    domain::{MemberId, ProjectId, TaskId},
    services::{CreateTaskBody, CreateTaskRequest, MoveTaskBody, MoveTaskCommand, TaskBoardService},
};
use kanban::telemetry;
use mockable::DefaultClock;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "kanban_admin", about = "Administer the kanban task store")]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or update the database schema.
    Migrate,
    /// List a project's tasks in board order.
    List {
        #[arg(long)]
        project: ProjectId,
    },
    /// Append a task to a column.
    Create {
        #[arg(long)]
        project: ProjectId,
        #[arg(long)]
        title: String,
        /// Column to append to; omit for the backlog.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<MemberId>,
    },
    /// Move a task to a position, optionally in another column.
    Move {
        #[arg(long)]
        task: String,
        /// Destination column; omit for the backlog.
        #[arg(long)]
        status: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        order: i64,
    },
    /// Delete a task.
    Delete {
        #[arg(long)]
        task: TaskId,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    telemetry::init("warn");
    let Cli { database, command } = Cli::parse();
    let settings = database.into_settings();
    info!(url = %settings.redacted_url(), "connecting to task store");
    let pool = settings.build_pool()?;
    let repository = Arc::new(PostgresTaskRepository::new(pool));
    let service = TaskBoardService::new(Arc::clone(&repository), Arc::new(DefaultClock));

    match command {
        Command::Migrate => {
            let pool = repository.pool().clone();
            tokio::task::spawn_blocking(move || -> Result<(), BoxError> {
                let mut connection = pool.get()?;
                apply_migrations(&mut connection)?;
                Ok(())
            })
            .await??;
            info!("migrations applied");
            Ok(())
        }
        Command::List { project } => emit(&service.list_project_tasks(project).await?),
        Command::Create {
            project,
            title,
            status,
            description,
            assignee,
        } => {
            let request = CreateTaskRequest::try_from(CreateTaskBody {
                project_id: project,
                title,
                description,
                status,
                assigned_to_id: assignee,
            })?;
            emit(&service.create_task(request).await?)
        }
        Command::Move {
            task,
            status,
            order,
        } => {
            let command = MoveTaskCommand::parse(&task, &MoveTaskBody { status, order })?;
            emit(&service.move_task(command).await?)
        }
        Command::Delete { task } => emit(&service.delete_task(task).await?),
    }
}

fn emit(value: &impl Serialize) -> Result<(), BoxError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
