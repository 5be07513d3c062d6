//! Kanban: task board storage with dense per-column ordering.
//!
//! Projects organize tasks into columns (`todo`, `in-progress`, `done`, and
//! an unassigned backlog). Within each project and column, task positions
//! always form the sequence `0..n`. Creating a task appends it, moving a task
//! shifts the siblings it passes over, and deleting a task closes its gap,
//! each as one atomic unit against the store.
//!
//! # Architecture
//!
//! Kanban follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, memory)
//!
//! # Modules
//!
//! - [`task`]: Task creation, moves, edits, and deletion
//! - [`config`]: Database settings from the environment
//! - [`telemetry`]: Tracing subscriber setup for binaries

pub mod config;
pub mod task;
pub mod telemetry;
