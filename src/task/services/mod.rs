//! Application services for task board orchestration.

mod board;
mod commands;

pub use board::{TaskBoardError, TaskBoardResult, TaskBoardService};
pub use commands::{
    CreateTaskBody, CreateTaskRequest, MoveTaskBody, MoveTaskCommand, UpdateTaskRequest,
};
