//! Domain model for the task board.
//!
//! The domain owns task values, column identifiers, and the reordering
//! planner that every adapter applies. Nothing here touches storage.

mod error;
mod ids;
mod ordering;
mod status;
mod task;
mod values;

pub use error::TaskDomainError;
pub use ids::{MemberId, ProjectId, TaskId};
pub use ordering::{MovePlan, Partition, Shift, ShiftDirection, plan_move, plan_removal};
pub use status::{Column, TaskStatus};
pub use task::{NewTask, PersistedTaskData, Task, TaskEdit};
pub use values::{Position, TaskTitle, normalize_description};
